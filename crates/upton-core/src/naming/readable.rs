//! Human-readable cache filenames.
//!
//! Truncation means two long URIs sharing a prefix map to the same file.
//! That is accepted: callers who need uniqueness use the hashed style.

use std::path::Path;

use super::{CACHE_EXTENSION, MAX_FILENAME_LENGTH};

/// Keeps only ASCII letters, digits, `-` and `_`.
pub fn sanitize_uri(uri: &str) -> String {
    uri.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Sanitized URI, truncated so that
/// `name + ".html" + cache_location` fits in [`MAX_FILENAME_LENGTH`].
pub fn readable_filename(uri: &str, cache_location: &Path) -> String {
    let suffix_len = CACHE_EXTENSION.len() + 1;
    let location_len = cache_location.as_os_str().len();
    let max = MAX_FILENAME_LENGTH
        .saturating_sub(suffix_len)
        .saturating_sub(location_len);

    let mut name = sanitize_uri(uri);
    // Sanitized output is pure ASCII, so byte truncation is char-safe.
    name.truncate(max);
    format!("{}.{}", name, CACHE_EXTENSION)
}
