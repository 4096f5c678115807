//! MD5-based cache filenames.

use md5::{Digest, Md5};

use super::CACHE_EXTENSION;

/// Lowercase hex MD5 of the URI bytes, plus the cache extension.
pub fn hashed_filename(uri: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(uri.as_bytes());
    format!("{}.{}", hex::encode(hasher.finalize()), CACHE_EXTENSION)
}
