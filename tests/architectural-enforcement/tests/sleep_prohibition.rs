//! Integration Test: Sleep Prohibition
//!
//! **Policy**: The session core MUST NOT call sleep. Every delay in a session
//! is a phase-owned timer in the timer registry, so it is cancelled when the
//! phase ends. A bare sleep survives teardown and reintroduces the stale
//! timer problem.
//!
//! **Exceptions**: test code.

use architectural_enforcement::{assert_clean, scan};

#[test]
fn test_no_sleep_in_session_core() {
    let violations = scan("session/core/src", |_, _, code| {
        code.contains("::sleep(") || code.contains(".sleep(")
    });
    assert_clean("Sleep calls found in the session core", &violations);
}

#[test]
fn test_timers_use_interval() {
    let uses_interval = scan("session/core/src", |_, _, code| code.contains("interval_at("));
    assert!(
        !uses_interval.is_empty(),
        "the timer registry should schedule ticks with tokio::time::interval_at"
    );
}
