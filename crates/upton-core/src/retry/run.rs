//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::FetchError;

/// Runs `f` until it succeeds or the retry policy says to stop.
///
/// `on_retry` is called with the attempt number and error before each sleep.
pub fn run_with_retry<T, F, R>(policy: &RetryPolicy, mut f: F, mut on_retry: R) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
    R: FnMut(u32, &FetchError),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        on_retry(attempt, &e);
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }
}
