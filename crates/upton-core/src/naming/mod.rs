//! Cache filename derivation.
//!
//! A URI maps to exactly one filename per style, across runs and processes:
//! - hashed (default): MD5 hex digest of the URI.
//! - readable: the URI stripped to `[A-Za-z0-9_-]` and truncated so the full
//!   path stays within [`MAX_FILENAME_LENGTH`].

mod hashed;
mod readable;

pub use hashed::hashed_filename;
pub use readable::{readable_filename, sanitize_uri};

use std::path::Path;

/// Upper bound on `cache_location` + readable filename, for cross-platform path safety.
pub const MAX_FILENAME_LENGTH: usize = 130;

/// Extension given to every cache entry.
pub const CACHE_EXTENSION: &str = "html";

/// Which naming scheme to use for cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStyle {
    #[default]
    Hashed,
    Readable,
}

impl FilenameStyle {
    pub fn from_readable_flag(readable: bool) -> Self {
        if readable {
            FilenameStyle::Readable
        } else {
            FilenameStyle::Hashed
        }
    }
}

/// Derives the cache filename for `uri` under `cache_location`.
///
/// `cache_location` only matters for the readable style, where its length
/// limits how much of the URI survives.
pub fn cache_filename(uri: &str, style: FilenameStyle, cache_location: &Path) -> String {
    match style {
        FilenameStyle::Hashed => hashed_filename(uri),
        FilenameStyle::Readable => readable_filename(uri, cache_location),
    }
}
