//! Page fetching: the transport seam plus the skip/retry policy around it.

mod curl_fetcher;

pub use curl_fetcher::CurlFetcher;

use crate::error::FetchError;
use crate::retry::{classify, run_with_retry, ErrorKind, RetryPolicy};

/// Performs a single GET for a URI and returns the body as text.
///
/// Implementations report failures as typed [`FetchError`]s and leave skip and
/// retry decisions to [`fetch_resource`].
pub trait ResourceFetcher {
    fn fetch(&self, uri: &str) -> Result<String, FetchError>;
}

impl<F: ResourceFetcher + ?Sized> ResourceFetcher for Box<F> {
    fn fetch(&self, uri: &str) -> Result<String, FetchError> {
        (**self).fetch(uri)
    }
}

impl<F: ResourceFetcher + ?Sized> ResourceFetcher for &F {
    fn fetch(&self, uri: &str) -> Result<String, FetchError> {
        (**self).fetch(uri)
    }
}

/// Why a fetch produced no content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    ServerError,
    ServiceUnavailable,
    InvalidUri,
}

impl SkipReason {
    fn from_kind(kind: ErrorKind) -> Option<Self> {
        match kind {
            ErrorKind::NotFound => Some(SkipReason::NotFound),
            ErrorKind::ServerError => Some(SkipReason::ServerError),
            ErrorKind::ServiceUnavailable => Some(SkipReason::ServiceUnavailable),
            ErrorKind::InvalidUri => Some(SkipReason::InvalidUri),
            ErrorKind::Timeout | ErrorKind::Other => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkipReason::NotFound => "404 error",
            SkipReason::ServerError => "500 error",
            SkipReason::ServiceUnavailable => "503 error",
            SkipReason::InvalidUri => "invalid URI",
        }
    }
}

/// Result of a fetch once skippable failures have been absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(String),
    Skipped(SkipReason),
}

impl FetchOutcome {
    /// Body text, with a skipped fetch reading as empty.
    pub fn content(&self) -> &str {
        match self {
            FetchOutcome::Fetched(body) => body,
            FetchOutcome::Skipped(_) => "",
        }
    }

    pub fn into_content(self) -> String {
        match self {
            FetchOutcome::Fetched(body) => body,
            FetchOutcome::Skipped(_) => String::new(),
        }
    }
}

/// Fetches `uri`, retrying timeouts per `policy` and turning 404/500/503 and
/// malformed URIs into [`FetchOutcome::Skipped`]. Any other failure, including
/// a timeout the policy gave up on, is returned as an error.
pub fn fetch_resource<F>(
    fetcher: &F,
    uri: &str,
    policy: &RetryPolicy,
    verbose: bool,
) -> Result<FetchOutcome, FetchError>
where
    F: ResourceFetcher + ?Sized,
{
    if verbose {
        tracing::info!("Downloading from {}", uri);
    }
    let res = run_with_retry(
        policy,
        || fetcher.fetch(uri),
        |attempt, err| {
            if verbose {
                tracing::warn!(attempt, "Timeout: {} ({}), retrying", uri, err);
            }
        },
    );
    match res {
        Ok(body) => {
            if verbose {
                tracing::info!("Downloaded {}", uri);
            }
            Ok(FetchOutcome::Fetched(body))
        }
        Err(err) => {
            let kind = classify(&err);
            match SkipReason::from_kind(kind) {
                Some(reason) => {
                    if verbose {
                        tracing::warn!("{}, skipping: {} ({})", reason.label(), uri, err);
                    }
                    Ok(FetchOutcome::Skipped(reason))
                }
                None => {
                    if verbose && kind == ErrorKind::Timeout {
                        tracing::warn!("Timeout: {} ({}), giving up", uri, err);
                    }
                    Err(err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing_subscriber::fmt::MakeWriter;

    /// In-memory log sink for asserting on emitted events.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, sink.text())
    }

    /// Replays scripted results, then keeps returning the last one.
    struct Scripted {
        replies: RefCell<VecDeque<Result<String, FetchError>>>,
        calls: RefCell<u32>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, FetchError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(0),
            }
        }
    }

    impl ResourceFetcher for Scripted {
        fn fetch(&self, _uri: &str) -> Result<String, FetchError> {
            *self.calls.borrow_mut() += 1;
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".into())))
        }
    }

    const URI: &str = "http://example.com/";

    #[test]
    fn success_is_fetched() {
        let f = Scripted::new(vec![Ok("<html></html>".into())]);
        let out = fetch_resource(&f, URI, &RetryPolicy::default(), true).unwrap();
        assert_eq!(out, FetchOutcome::Fetched("<html></html>".into()));
    }

    #[test]
    fn skippable_statuses_become_empty() {
        for (code, reason) in [
            (404, SkipReason::NotFound),
            (500, SkipReason::ServerError),
            (503, SkipReason::ServiceUnavailable),
        ] {
            let f = Scripted::new(vec![Err(FetchError::Http(code))]);
            let out = fetch_resource(&f, URI, &RetryPolicy::default(), false).unwrap();
            assert_eq!(out, FetchOutcome::Skipped(reason));
            assert_eq!(out.content(), "");
            assert_eq!(*f.calls.borrow(), 1);
        }
    }

    #[test]
    fn invalid_uri_is_skipped() {
        let f = Scripted::new(vec![Err(FetchError::InvalidUri("nope".into()))]);
        let out = fetch_resource(&f, "nope", &RetryPolicy::default(), false).unwrap();
        assert_eq!(out, FetchOutcome::Skipped(SkipReason::InvalidUri));
    }

    #[test]
    fn timeouts_retry_until_answer() {
        let f = Scripted::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Ok("late".into()),
        ]);
        let out = fetch_resource(&f, URI, &RetryPolicy::default(), true).unwrap();
        assert_eq!(out.into_content(), "late");
        assert_eq!(*f.calls.borrow(), 4);
    }

    #[test]
    fn bounded_policy_surfaces_timeout() {
        let f = Scripted::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Ok("never reached".into()),
        ]);
        let policy = RetryPolicy::bounded(2, Duration::ZERO, Duration::ZERO);
        let err = fetch_resource(&f, URI, &policy, false).unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
        assert_eq!(*f.calls.borrow(), 2);
    }

    #[test]
    fn giving_up_on_timeout_is_logged_when_verbose() {
        let policy = RetryPolicy::bounded(2, Duration::ZERO, Duration::ZERO);
        let f = Scripted::new(vec![Err(FetchError::Timeout), Err(FetchError::Timeout)]);
        let (res, logs) = with_captured_logs(|| fetch_resource(&f, URI, &policy, true));
        assert!(matches!(res, Err(FetchError::Timeout)));
        assert_eq!(logs.matches("retrying").count(), 1, "{}", logs);
        assert!(logs.contains("giving up"), "{}", logs);

        let quiet = Scripted::new(vec![Err(FetchError::Timeout), Err(FetchError::Timeout)]);
        let (_, logs) = with_captured_logs(|| fetch_resource(&quiet, URI, &policy, false));
        assert!(!logs.contains("giving up"), "{}", logs);
    }

    #[test]
    fn other_failures_propagate() {
        let f = Scripted::new(vec![Err(FetchError::Http(403))]);
        let err = fetch_resource(&f, URI, &RetryPolicy::default(), false).unwrap_err();
        assert!(matches!(err, FetchError::Http(403)));
    }
}
