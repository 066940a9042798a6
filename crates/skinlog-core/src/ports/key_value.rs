//! Key-value store port (driven/secondary port)
//!
//! App-private persisted storage for small sync-state values: the
//! watermark, the more-history flag, and the photo-cache snapshot.
//! String-keyed, string-valued, async.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, flat files, platform preferences) and don't need
//!   domain-level classification.
//! - Values are opaque strings; callers own the encoding. The state layer
//!   stores integers as decimal strings and structures as JSON.

/// Port trait for persisted key-value storage
#[async_trait::async_trait]
pub trait IKeyValueStore: Send + Sync {
    /// Reads the value for `key`, or `None` if absent
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes `value` under `key`, replacing any existing value
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Removes `key` if present; removing an absent key is not an error
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}
