//! Skinlog Cache - Local state persistence
//!
//! Single source of truth for what the UI renders:
//! - Day-bucketed photo cache with the per-day cap policy
//! - Persisted sync bookkeeping (watermark, more-history flag)
//! - SQLite-backed key-value adapter
//!
//! ## Architecture
//!
//! [`PhotoStore`] is pure in-memory state with per-bucket atomic
//! operations. [`SyncStateStore`] layers persistence on top of the
//! `IKeyValueStore` port from `skinlog-core`, and
//! [`SqliteKeyValueStore`] is the driven adapter implementing that port
//! on SQLite.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use skinlog_cache::{DatabasePool, PhotoStore, SqliteKeyValueStore, SyncStateStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/skinlog/state.db")).await?;
//! let kv = Arc::new(SqliteKeyValueStore::new(pool.pool().clone()));
//! let state = SyncStateStore::new(kv);
//! let store = PhotoStore::new(3);
//! state.load_cache(&store).await;
//! # Ok(())
//! # }
//! ```

pub mod kv;
pub mod pool;
pub mod state;
pub mod store;

pub use kv::SqliteKeyValueStore;
pub use pool::DatabasePool;
pub use state::SyncStateStore;
pub use store::PhotoStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of persisted state failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
