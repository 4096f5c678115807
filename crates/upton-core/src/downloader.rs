//! Fetch-or-stash decision for a single URI.
//!
//! ```text
//! cache disabled  -> fetch                          -> { body, from_resource: true }
//! cache hit       -> read stash                     -> { stash, from_resource: false }
//! cache miss      -> fetch, annotate, write stash   -> { body, from_resource: true }
//! ```
//!
//! On a miss the caller gets the body as fetched while the stash holds the
//! annotated copy, so the next call (a hit) returns the annotated text. Set
//! [`MissReturn::Annotated`] to get the annotated text on the miss as well.

use std::fmt;
use std::path::PathBuf;

use crate::annotate::{provenance_message, Annotator, TagScanAnnotator};
use crate::cache::CacheStore;
use crate::config::{DownloaderOptions, MissReturn};
use crate::error::DownloadError;
use crate::fetch::{fetch_resource, CurlFetcher, FetchOutcome, ResourceFetcher};
use crate::naming::{cache_filename, FilenameStyle};
use crate::retry::RetryPolicy;

/// What [`Downloader::get`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub content: String,
    /// True iff this call went to the network.
    pub from_resource: bool,
}

/// What [`Downloader::retrieve`] returns: like [`FetchResult`] but keeps
/// skipped fetches distinguishable from empty pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    pub outcome: FetchOutcome,
    pub from_resource: bool,
}

/// Fetches one URI, going through the on-disk stash when caching is enabled.
pub struct Downloader {
    uri: String,
    options: DownloaderOptions,
    store: CacheStore,
    filename: String,
    policy: RetryPolicy,
    fetcher: Box<dyn ResourceFetcher>,
    annotator: Box<dyn Annotator>,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("uri", &self.uri)
            .field("options", &self.options)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Resolves `options`, bootstraps the cache directory, and prepares a
    /// curl-backed downloader for `uri`.
    pub fn new(uri: impl Into<String>, options: DownloaderOptions) -> Result<Self, DownloadError> {
        let fetcher = CurlFetcher::new(options.http.clone());
        Self::with_fetcher(uri, options, fetcher)
    }

    /// Like [`Downloader::new`] with a caller-supplied transport.
    pub fn with_fetcher<F>(
        uri: impl Into<String>,
        options: DownloaderOptions,
        fetcher: F,
    ) -> Result<Self, DownloadError>
    where
        F: ResourceFetcher + 'static,
    {
        let uri = uri.into();
        let location = options.cache_location.clone();
        let options = options
            .resolved()
            .map_err(|e| DownloadError::io("resolve cache location", location, e))?;
        let store = CacheStore::bootstrap(&options.cache_location)?;
        let filename = cache_filename(&uri, options.filename_style(), store.root());
        let policy = options.retry.policy();
        Ok(Downloader {
            uri,
            options,
            store,
            filename,
            policy,
            fetcher: Box::new(fetcher),
            annotator: Box::new(TagScanAnnotator),
        })
    }

    /// Replaces the default tag-scan annotator.
    pub fn with_annotator<A>(mut self, annotator: A) -> Self
    where
        A: Annotator + 'static,
    {
        self.annotator = Box::new(annotator);
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn options(&self) -> &DownloaderOptions {
        &self.options
    }

    /// Cache filename for this URI.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Where this URI's stash entry lives (whether or not it exists yet).
    pub fn cache_path(&self) -> PathBuf {
        self.store.entry_path(&self.filename)
    }

    /// Returns the page content, from the stash when possible.
    ///
    /// A skipped fetch (404, 500, 503, malformed URI) comes back as empty
    /// content with `from_resource: true`; use [`Downloader::retrieve`] to tell
    /// it apart from an empty page.
    pub fn get(&self) -> Result<FetchResult, DownloadError> {
        let Retrieval {
            outcome,
            from_resource,
        } = self.retrieve()?;
        Ok(FetchResult {
            content: outcome.into_content(),
            from_resource,
        })
    }

    /// Same decision tree as [`Downloader::get`], with skipped fetches reported
    /// as [`FetchOutcome::Skipped`].
    pub fn retrieve(&self) -> Result<Retrieval, DownloadError> {
        if !self.options.cache {
            self.note(format_args!("Stashing disabled. Will download from the internet."));
            return Ok(Retrieval {
                outcome: self.fetch()?,
                from_resource: true,
            });
        }

        self.note(format_args!(
            "Stashing enabled. Will try reading {} data from cache.",
            self.uri
        ));
        if self.store.contains(&self.filename) {
            self.note(format_args!("Cache of {} available", self.uri));
            let content = self.store.read(&self.filename)?;
            return Ok(Retrieval {
                outcome: FetchOutcome::Fetched(content),
                from_resource: false,
            });
        }

        if self.readable() {
            self.note(format_args!(
                "Cache of {} unavailable at {}. Will download from the internet",
                self.uri, self.filename
            ));
        } else {
            self.note(format_args!(
                "Cache of {} unavailable. Will download from the internet",
                self.uri
            ));
        }
        let outcome = self.fetch()?;
        let stamped = self.stamp(outcome.content());

        let path = self.cache_path();
        if self.readable() {
            self.note(format_args!(
                "Writing {} data to the cache at {}",
                self.uri,
                path.display()
            ));
        } else {
            self.note(format_args!("Writing {} data to the cache", self.uri));
        }
        self.store.write_new(&self.filename, &stamped)?;
        tracing::debug!(uri = %self.uri, path = %path.display(), "stashed page");

        let outcome = match (self.options.miss_returns, outcome) {
            (MissReturn::Annotated, FetchOutcome::Fetched(_)) => FetchOutcome::Fetched(stamped),
            (_, outcome) => outcome,
        };
        Ok(Retrieval {
            outcome,
            from_resource: true,
        })
    }

    fn fetch(&self) -> Result<FetchOutcome, DownloadError> {
        fetch_resource(
            self.fetcher.as_ref(),
            &self.uri,
            &self.policy,
            self.options.verbose,
        )
        .map_err(|source| DownloadError::Fetch {
            uri: self.uri.clone(),
            source,
        })
    }

    /// Content with the provenance comment spliced in, or unchanged if it has no root.
    fn stamp(&self, content: &str) -> String {
        let msg = provenance_message(&self.uri);
        self.annotator
            .annotate(content, &msg)
            .unwrap_or_else(|| content.to_string())
    }

    fn readable(&self) -> bool {
        self.options.filename_style() == FilenameStyle::Readable
    }

    fn note(&self, args: fmt::Arguments<'_>) {
        if self.options.verbose {
            tracing::info!("{}", args);
        }
    }
}
