use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::naming::FilenameStyle;
use crate::retry::RetryPolicy;

/// Timeout retry parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first). Unset = retry until the page answers.
    pub max_attempts: Option<u32>,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay_secs: 0.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Converts to a [`RetryPolicy`]. A non-positive or NaN base delay means no
    /// delay; one too large for a `Duration` is clamped to `max_delay_secs`.
    pub fn policy(&self) -> RetryPolicy {
        let max_delay = Duration::from_secs(self.max_delay_secs);
        let base = if self.base_delay_secs > 0.0 {
            Duration::try_from_secs_f64(self.base_delay_secs).unwrap_or(max_delay)
        } else {
            Duration::ZERO
        };
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: base,
            max_delay,
        }
    }
}

/// Transport settings for the curl fetcher (optional `[http]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout; expiry counts as a retryable timeout.
    pub timeout_secs: u64,
    pub follow_redirects: bool,
    pub max_redirections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 60,
            follow_redirects: true,
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// What `Downloader::get` hands back on a cache miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissReturn {
    /// The body exactly as fetched; the stashed copy carries the comment.
    #[default]
    Raw,
    /// The same text that was written to the cache.
    Annotated,
}

/// Downloader options, loadable from `~/.config/upton/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderOptions {
    /// Read from and write to the cache.
    pub cache: bool,
    /// Directory holding stashed pages.
    pub cache_location: PathBuf,
    /// Log every cache/fetch decision at info level.
    pub verbose: bool,
    /// Use sanitized URIs instead of MD5 digests as filenames.
    pub readable_filenames: bool,
    pub miss_returns: MissReturn,
    pub retry: RetryConfig,
    pub http: HttpConfig,
}

impl Default for DownloaderOptions {
    fn default() -> Self {
        Self {
            cache: true,
            cache_location: default_cache_location(),
            verbose: false,
            readable_filenames: false,
            miss_returns: MissReturn::Raw,
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl DownloaderOptions {
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn cache_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_location = path.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn readable_filenames(mut self, readable: bool) -> Self {
        self.readable_filenames = readable;
        self
    }

    pub fn miss_returns(mut self, mode: MissReturn) -> Self {
        self.miss_returns = mode;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn filename_style(&self) -> FilenameStyle {
        FilenameStyle::from_readable_flag(self.readable_filenames)
    }

    /// Returns a copy with `cache_location` made absolute against the current directory.
    pub fn resolved(mut self) -> std::io::Result<Self> {
        self.cache_location = absolute(&self.cache_location)?;
        Ok(self)
    }
}

/// `<temp dir>/upton`.
pub fn default_cache_location() -> PathBuf {
    std::env::temp_dir().join("upton")
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("upton")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load options from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DownloaderOptions> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Like [`load_or_init`] with an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<DownloaderOptions> {
    if !path.exists() {
        let default_opts = DownloaderOptions::default();
        let toml = toml::to_string_pretty(&default_opts)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_opts);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let opts: DownloaderOptions =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(opts)
}
