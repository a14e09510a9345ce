//! Configuration file parser for `updater.toml`.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::category::SymbolTable;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed fine but cannot be used.
    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site root; the feed lives at `<base_url>/articles.atom`.
    pub base_url: String,

    /// Waits between fetch attempts, in seconds. The length is the attempt count.
    pub backoff_schedule_secs: Vec<u64>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted feed body.
    pub max_feed_bytes: usize,

    /// Offset from UTC used when printing publish dates.
    pub utc_offset_minutes: i32,

    /// strftime pattern for publish dates.
    pub date_format: String,

    /// Category priority table.
    pub symbols: SymbolTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://freyyj.org".to_string(),
            backoff_schedule_secs: vec![1, 3, 10],
            request_timeout_secs: 30,
            max_feed_bytes: 10 * 1024 * 1024,
            utc_offset_minutes: 0,
            date_format: "%B %-d, %Y".to_string(),
            symbols: SymbolTable::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "base_url",
        "backoff_schedule_secs",
        "request_timeout_secs",
        "max_feed_bytes",
        "utc_offset_minutes",
        "date_format",
        "symbols",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    /// - Unusable values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
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
            Ok(_) => {}
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

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::debug!(base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.feed_url()?;

        if self.backoff_schedule_secs.is_empty() {
            return Err(ConfigError::Invalid {
                key: "backoff_schedule_secs",
                reason: "at least one attempt is required".to_string(),
            });
        }

        self.utc_offset()?;

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Invalid {
                key: "date_format",
                reason: format!("'{}' is not a valid strftime pattern", self.date_format),
            });
        }

        Ok(())
    }

    /// Absolute URL of the articles feed.
    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            key: "base_url",
            reason,
        };

        let base = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme '{}' (only http/https allowed)",
                base.scheme()
            )));
        }

        if base.query().is_some() || base.fragment().is_some() {
            return Err(invalid(
                "query strings and fragments are not allowed".to_string(),
            ));
        }

        let mut url = base;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be used as a base URL".to_string()))?
            .pop_if_empty()
            .push("articles.atom");
        Ok(url)
    }

    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_schedule_secs
            .iter()
            .map(|secs| Duration::from_secs(*secs))
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                key: "utc_offset_minutes",
                reason: format!("{} minutes is out of range", self.utc_offset_minutes),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
