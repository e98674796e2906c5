//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async code in the workspace MUST NOT use blocking I/O.
//! **Required**: `tokio::fs` and async `reqwest`, not `std::fs` or
//! `reqwest::blocking`.
//!
//! **Acceptable**: blocking file reads in non-async functions such as the
//! config loader, which runs before the session starts.

use architectural_enforcement::{assert_clean, scan};

const BLOCKING: [&str; 5] = [
    "std::fs::",
    "fs::read_to_string(",
    "std::net::",
    "reqwest::blocking",
    "std::thread::sleep",
];

fn blocking_in_async(dir: &str) -> Vec<architectural_enforcement::Violation> {
    scan(dir, |file, idx, code| {
        BLOCKING.iter().any(|pattern| code.contains(pattern)) && file.in_async_fn(idx)
    })
}

#[test]
fn test_no_blocking_io_in_core_async_code() {
    assert_clean(
        "Blocking I/O inside async functions (session core)",
        &blocking_in_async("session/core/src"),
    );
}

#[test]
fn test_no_blocking_io_in_cli_async_code() {
    assert_clean(
        "Blocking I/O inside async functions (CLI)",
        &blocking_in_async("session/cli/src"),
    );
}

#[test]
fn test_no_blocking_http_client_anywhere() {
    let violations = scan("session", |_, _, code| code.contains("reqwest::blocking"));
    assert_clean("Blocking HTTP client in use", &violations);
}
