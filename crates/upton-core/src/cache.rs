//! On-disk page stash.
//!
//! A single flat directory, owner-only, with one file per URI. Entries are
//! written once and never replaced or removed here; a hit stays a hit until
//! something outside this crate deletes the file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::DownloadError;

/// Permissions applied to a freshly created cache directory.
#[cfg(unix)]
pub const CACHE_DIR_MODE: u32 = 0o700;

/// Handle to a bootstrapped cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Ensures `root` exists, creating it with owner-only permissions if missing.
    ///
    /// An existing directory is used as-is; its permissions are left alone.
    pub fn bootstrap(root: &Path) -> Result<Self, DownloadError> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(path = %root.display(), "cache directory already present");
            }
            Ok(_) => return Err(DownloadError::NotADirectory(root.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir(root)
                    .map_err(|e| DownloadError::io("create cache directory", root, e))?;
                restrict_permissions(root)?;
                tracing::debug!(path = %root.display(), "created cache directory");
            }
            Err(e) => return Err(DownloadError::io("stat cache directory", root, e)),
        }
        Ok(CacheStore {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry_path(name).exists()
    }

    /// Reads an entry in full.
    pub fn read(&self, name: &str) -> Result<String, DownloadError> {
        let path = self.entry_path(name);
        fs::read_to_string(&path).map_err(|e| DownloadError::io("read cache entry", path, e))
    }

    /// Stores `content` under `name` unless an entry already exists.
    ///
    /// The content goes to a temp file in the cache directory first and is then
    /// linked into place without clobbering, so readers never see a partial
    /// entry and a concurrent writer for the same name cannot be overwritten.
    /// Returns `false` when another writer got there first.
    pub fn write_new(&self, name: &str, content: &str) -> Result<bool, DownloadError> {
        let path = self.entry_path(name);
        let mut tmp = tempfile::Builder::new()
            .prefix(".stash-")
            .suffix(".part")
            .tempfile_in(&self.root)
            .map_err(|e| DownloadError::io("create temp file in", &self.root, e))?;
        if let Err(e) = tmp.write_all(content.as_bytes()).and_then(|()| tmp.flush()) {
            return Err(DownloadError::io("write temp file", tmp.path(), e));
        }

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "cache entry appeared concurrently; keeping it");
                Ok(false)
            }
            Err(e) => Err(DownloadError::io("write cache entry", path, e.error)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(dir: &Path) -> Result<(), DownloadError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(CACHE_DIR_MODE))
        .map_err(|e| DownloadError::io("set permissions on", dir, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_dir: &Path) -> Result<(), DownloadError> {
    Ok(())
}
