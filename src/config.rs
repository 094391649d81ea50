//! Configuration file parser for the release feed pipeline.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::feed::item::normalize_download_url;
use crate::release::{fallback_releases, Release};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed_url '{url}': {reason}")]
    InvalidFeedUrl { url: String, reason: String },

    #[error("fallback must list at least one release")]
    EmptyFallback,

    #[error("Invalid fallback release #{index}: {reason}")]
    InvalidFallback { index: usize, reason: String },

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Everything the pipeline needs to know about its upstream feed.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Syndication feed listing the published ISOs and their checksums.
    pub feed_url: String,

    /// Client identifier sent with every feed request.
    pub user_agent: String,

    /// Product name used to label releases ("<product> <Edition>").
    pub product: String,

    /// Architecture of every ISO in the feed.
    pub architecture: String,

    /// Transport timeout for the feed request, in seconds.
    pub request_timeout_secs: u64,

    /// Largest feed body accepted, in bytes.
    pub max_feed_bytes: usize,

    /// Releases served when the feed is unreachable or unusable.
    pub fallback: Vec<Release>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: "https://sourceforge.net/projects/prismlinux/rss?path=/Beta&limit=50"
                .to_string(),
            user_agent: "PrismLinux-Website/1.0".to_string(),
            product: "PrismLinux".to_string(),
            architecture: "x86_64".to_string(),
            request_timeout_secs: 30,
            max_feed_bytes: 10 * 1024 * 1024, // 10MB
            fallback: fallback_releases(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "feed_url",
        "user_agent",
        "product",
        "architecture",
        "request_timeout_secs",
        "max_feed_bytes",
        "fallback",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    /// - Non-http(s) `feed_url` → `Err(ConfigError::InvalidFeedUrl)`
    /// - `fallback = []` → `Err(ConfigError::EmptyFallback)`
    /// - Fallback entry with blank version or non-http(s) `downloadUrl` →
    ///   `Err(ConfigError::InvalidFallback)`
    /// - `request_timeout_secs = 0` → `Err(ConfigError::ZeroTimeout)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        // from a maliciously large or corrupted config file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            feed_url = %config.feed_url,
            fallback = config.fallback.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.feed_url).map_err(|e| ConfigError::InvalidFeedUrl {
            url: self.feed_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidFeedUrl {
                url: self.feed_url.clone(),
                reason: format!("unsupported scheme {} (only http/https allowed)", url.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.fallback.is_empty() {
            return Err(ConfigError::EmptyFallback);
        }
        for (index, release) in self.fallback.iter().enumerate() {
            let reason = if release.version.trim().is_empty() {
                "version is empty".to_string()
            } else if release.download_url.trim().is_empty() {
                "downloadUrl is empty".to_string()
            } else if normalize_download_url(&release.download_url).is_none() {
                format!(
                    "downloadUrl '{}' is not an absolute http(s) URL",
                    release.download_url
                )
            } else {
                continue;
            };
            return Err(ConfigError::InvalidFallback { index, reason });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
