//! Retry policy and failure classification for page fetches.
//!
//! A fetch failure is sorted into one of three buckets: skipped (the page is
//! treated as empty), retried (timeouts), or fatal. The buckets live in
//! [`ErrorKind`]; [`RetryPolicy`] decides how long to wait before the next
//! attempt.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
