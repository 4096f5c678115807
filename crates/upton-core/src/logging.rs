//! Subscriber setup for programs embedding the downloader.
//!
//! The library only emits `tracing` events; a scraper binary calls one of
//! these once at startup to see them. Events go to a file under the XDG state
//! dir, or to stderr when that is not writable.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,upton_core=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file, `~/.local/state/upton/upton.log`; creates the directory.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("upton")?;
    let path = xdg_dirs
        .place_state_file("upton.log")
        .context("create log directory")?;
    Ok(path)
}

/// Opens `path` for appending. The mutex serialises events from concurrent
/// scrapers so lines never interleave.
fn open_log_file(path: &Path) -> Result<Mutex<fs::File>> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok(Mutex::new(file))
}

/// Initialize structured logging to [`log_file_path`].
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let writer = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;

    tracing::info!("upton logging initialized at {}", path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when `init_logging()` fails.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
