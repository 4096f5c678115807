use std::time::Duration;

/// Classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 404. Skipped.
    NotFound,
    /// HTTP 500. Skipped.
    ServerError,
    /// HTTP 503. Skipped.
    ServiceUnavailable,
    /// The URI could not be parsed. Skipped.
    InvalidUri,
    /// Request timed out. Retried.
    Timeout,
    /// Anything else. Propagated to the caller.
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff for timeouts.
///
/// The default has no attempt limit and no delay, so a timing-out page is
/// re-requested immediately until it answers. Set `max_attempts` to bound it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). `None` = unbounded.
    pub max_attempts: Option<u32>,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after `max_attempts` tries.
    pub fn bounded(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            base_delay,
            max_delay,
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if kind != ErrorKind::Timeout {
            return RetryDecision::NoRetry;
        }
        if let Some(max) = self.max_attempts {
            if attempt >= max {
                return RetryDecision::NoRetry;
            }
        }
        // base * 2^(attempt-1), capped.
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}
