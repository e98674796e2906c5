//! Integration Test: Library Hygiene
//!
//! **Policy**: The session core is a library. It propagates errors with `?`
//! or turns them into notices; it never panics on a backend reply. It also
//! never depends on a UI, terminal or CLI crate, so any surface can drive it.

use std::fs;

use architectural_enforcement::{assert_clean, scan, workspace_root};

#[test]
fn test_no_unwrap_in_core() {
    let violations = scan("session/core/src", |_, _, code| {
        code.contains(".unwrap()") || code.contains(".expect(")
    });
    assert_clean("unwrap()/expect() in session core library code", &violations);
}

#[test]
fn test_core_has_no_ui_imports() {
    const FORBIDDEN: [&str; 5] = [
        "ratatui",
        "crossterm",
        "clap::",
        "tracing_subscriber",
        "println!(",
    ];
    let violations = scan("session/core/src", |_, _, code| {
        FORBIDDEN.iter().any(|f| code.contains(f))
    });
    assert_clean("UI or CLI code inside the session core", &violations);
}

#[test]
fn test_core_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("session/core/Cargo.toml"))
        .unwrap_or_default();
    let dependencies = manifest
        .split("[dev-dependencies]")
        .next()
        .unwrap_or_default();

    for forbidden in ["ratatui", "crossterm", "clap", "tracing-subscriber"] {
        assert!(
            !dependencies.contains(forbidden),
            "session core must not depend on {forbidden}"
        );
    }
}
