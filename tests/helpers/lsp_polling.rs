//! Retry-with-timeout helpers for responses that depend on tsserver warming up.

#![allow(dead_code)]

use std::time::Duration;

/// Poll until `predicate` returns `Some`, or give up after `max_attempts`.
pub fn poll_until<T, F>(max_attempts: usize, delay_ms: u64, mut predicate: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    for attempt in 1..=max_attempts {
        if let Some(result) = predicate() {
            eprintln!("poll_until succeeded on attempt {}/{}", attempt, max_attempts);
            return Some(result);
        }

        if attempt < max_attempts {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
    }

    eprintln!("poll_until exhausted {} attempts", max_attempts);
    None
}
