//! Caching page downloader for scrapers.
//!
//! [`Downloader`] fetches a URI once and stashes the body on disk; later
//! requests for the same URI are answered from the stash. Stashed HTML gets a
//! provenance comment naming the source URI and retrieval time.
//!
//! ```no_run
//! use upton_core::{Downloader, DownloaderOptions};
//!
//! let opts = DownloaderOptions::default().verbose(true);
//! let page = Downloader::new("https://example.com/", opts)?.get()?;
//! println!("{} bytes (network: {})", page.content.len(), page.from_resource);
//! # Ok::<(), upton_core::DownloadError>(())
//! ```

pub mod annotate;
pub mod cache;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod naming;
pub mod retry;

pub use config::{DownloaderOptions, HttpConfig, MissReturn, RetryConfig};
pub use downloader::{Downloader, FetchResult, Retrieval};
pub use error::{DownloadError, FetchError};
pub use fetch::{FetchOutcome, ResourceFetcher, SkipReason};
