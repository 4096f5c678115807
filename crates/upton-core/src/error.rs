//! Error types surfaced by the downloader.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a [`ResourceFetcher`](crate::fetch::ResourceFetcher).
///
/// Kept separate from [`DownloadError`] so the retry layer can classify it
/// before deciding whether to skip, retry, or give up.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, malformed URL, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The URI could not be parsed.
    #[error("invalid URI: {0}")]
    InvalidUri(String),
    /// The request timed out (for fetchers that don't speak curl).
    #[error("request timed out")]
    Timeout,
    /// Any other transport failure from a non-curl fetcher.
    #[error("transport: {0}")]
    Transport(String),
}

/// Errors returned by [`Downloader`](crate::Downloader) operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Filesystem failure while bootstrapping, reading, or writing the cache.
    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The cache location exists but is not a directory.
    #[error("cache location is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// The fetch failed in a way that is neither skipped nor retried.
    #[error("fetching {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },
}

impl DownloadError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
