//! Configuration module for Skinlog.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and a builder for programmatic
//! use. The defaults encode the sync policy constants: a 24-hour auto-sync
//! interval, a 30-day bootstrap window, and the per-operation fetch caps.

use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Skinlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Synchronization policy and fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Hours between automatic syncs (the freshness threshold).
    pub auto_sync_interval_hours: i64,
    /// Days of history fetched when no watermark exists.
    pub first_load_days: i64,
    /// Seconds before an incremental sync fetch is abandoned.
    pub sync_timeout_secs: u64,
    /// Maximum records returned by one incremental sync.
    pub incremental_fetch_limit: usize,
    /// Records per backward pagination page (~30 days at 3/day).
    pub page_size: usize,
    /// Maximum records fetched by the first-run bootstrap.
    pub bootstrap_fetch_limit: usize,
    /// Seconds subtracted from the newest observed timestamp when
    /// advancing the watermark, so delayed-visibility writes are
    /// re-fetched on the next cycle.
    pub watermark_backoff_secs: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval_hours: 24,
            first_load_days: 30,
            sync_timeout_secs: 10,
            incremental_fetch_limit: 50,
            page_size: 90,
            bootstrap_fetch_limit: 200,
            watermark_backoff_secs: 5,
        }
    }
}

impl SyncConfig {
    /// The freshness threshold as a duration.
    pub fn auto_sync_interval(&self) -> Duration {
        Duration::hours(self.auto_sync_interval_hours)
    }

    /// The bootstrap fallback window as a duration.
    pub fn first_load_window(&self) -> Duration {
        Duration::days(self.first_load_days)
    }

    /// The fetch timeout as a std duration, for `tokio::time::timeout`.
    pub fn sync_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.sync_timeout_secs)
    }

    /// The watermark safety backoff as a duration.
    pub fn watermark_backoff(&self) -> Duration {
        Duration::seconds(self.watermark_backoff_secs)
    }
}

/// Local photo cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Photos retained per calendar day for recent captures.
    pub daily_photo_cap: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { daily_photo_cap: 3 }
    }
}

/// Remote document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Firestore project identifier.
    pub project_id: String,
    /// Collection holding photo documents.
    pub collection: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            collection: "photos".to_string(),
        }
    }
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Check cross-field consistency of the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sync.auto_sync_interval_hours <= 0 {
            anyhow::bail!("sync.auto_sync_interval_hours must be positive");
        }
        if self.sync.first_load_days <= 0 {
            anyhow::bail!("sync.first_load_days must be positive");
        }
        if self.sync.sync_timeout_secs == 0 {
            anyhow::bail!("sync.sync_timeout_secs must be positive");
        }
        if self.sync.incremental_fetch_limit == 0
            || self.sync.page_size == 0
            || self.sync.bootstrap_fetch_limit == 0
        {
            anyhow::bail!("sync fetch limits must be positive");
        }
        if self.sync.watermark_backoff_secs < 0 {
            anyhow::bail!("sync.watermark_backoff_secs must not be negative");
        }
        if self.cache.daily_photo_cap == 0 {
            anyhow::bail!("cache.daily_photo_cap must be positive");
        }
        Ok(())
    }

    /// Start building a configuration programmatically.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`Config`], starting from defaults.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn auto_sync_interval_hours(mut self, hours: i64) -> Self {
        self.config.sync.auto_sync_interval_hours = hours;
        self
    }

    pub fn first_load_days(mut self, days: i64) -> Self {
        self.config.sync.first_load_days = days;
        self
    }

    pub fn sync_timeout_secs(mut self, secs: u64) -> Self {
        self.config.sync.sync_timeout_secs = secs;
        self
    }

    pub fn daily_photo_cap(mut self, cap: usize) -> Self {
        self.config.cache.daily_photo_cap = cap;
        self
    }

    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.config.remote.project_id = id.into();
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.remote.collection = name.into();
        self
    }

    /// Validate and produce the final configuration.
    pub fn build(self) -> anyhow::Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
