//! Persisted sync bookkeeping
//!
//! [`SyncStateStore`] owns the three persisted values the sync engine
//! needs across restarts: the watermark, the more-history flag, and the
//! photo-cache snapshot. Everything goes through the `IKeyValueStore`
//! port; this layer owns the encodings (decimal millis for the watermark,
//! JSON for the snapshot).
//!
//! Read paths never fail: malformed or unreadable stored values degrade
//! to defaults with a warning, so a corrupt entry can cost at most one
//! re-sync, never a crash.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

use skinlog_core::domain::{DateKey, PhotoItem};
use skinlog_core::ports::IKeyValueStore;

use crate::store::PhotoStore;

/// Storage key for the watermark, as decimal epoch millis
const LAST_SYNC_KEY: &str = "skinlog_last_sync_time";
/// Storage key for the more-history flag
const HAS_MORE_KEY: &str = "skinlog_has_more_history";
/// Storage key for the photo-cache JSON snapshot
const CACHE_KEY: &str = "skinlog_photo_cache";

/// Persisted watermark, history flag, and cache snapshot
pub struct SyncStateStore {
    kv: Arc<dyn IKeyValueStore>,
}

impl SyncStateStore {
    /// Creates a state store over the given key-value adapter
    pub fn new(kv: Arc<dyn IKeyValueStore>) -> Self {
        Self { kv }
    }

    // ------------------------------------------------------------------
    // Watermark
    // ------------------------------------------------------------------

    /// The last successful sync instant, or `None` if never synced
    ///
    /// An unreadable or unparsable stored value reads as never-synced.
    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        let raw = match self.kv.get(LAST_SYNC_KEY).await {
            Ok(value) => value?,
            Err(err) => {
                warn!(error = %err, "Failed to read watermark, treating as never synced");
                return None;
            }
        };

        match raw.parse::<i64>() {
            Ok(millis) if millis > 0 => Utc.timestamp_millis_opt(millis).single(),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, value = %raw, "Malformed watermark, treating as never synced");
                None
            }
        }
    }

    /// Advances the watermark to `instant`
    ///
    /// The watermark is monotonically non-decreasing: an `instant` earlier
    /// than the stored value is ignored.
    pub async fn record_sync_time(&self, instant: DateTime<Utc>) -> anyhow::Result<()> {
        if let Some(current) = self.last_sync_time().await {
            if instant < current {
                debug!(
                    proposed = %instant,
                    current = %current,
                    "Ignoring watermark regression"
                );
                return Ok(());
            }
        }
        self.kv
            .set(LAST_SYNC_KEY, &instant.timestamp_millis().to_string())
            .await
    }

    // ------------------------------------------------------------------
    // More-history flag
    // ------------------------------------------------------------------

    /// Whether older history may remain on the server
    ///
    /// Defaults to `true` when unset: until a short pagination page proves
    /// otherwise, there may always be more.
    pub async fn has_more_history(&self) -> bool {
        match self.kv.get(HAS_MORE_KEY).await {
            Ok(Some(value)) => value != "false",
            Ok(None) => true,
            Err(err) => {
                warn!(error = %err, "Failed to read history flag, assuming more history");
                true
            }
        }
    }

    /// Records whether older history may remain
    pub async fn set_has_more_history(&self, has_more: bool) -> anyhow::Result<()> {
        self.kv
            .set(HAS_MORE_KEY, if has_more { "true" } else { "false" })
            .await
    }

    // ------------------------------------------------------------------
    // Photo-cache snapshot
    // ------------------------------------------------------------------

    /// Loads the persisted snapshot into `store`
    ///
    /// A missing snapshot leaves the store untouched; a malformed one is
    /// discarded with a warning.
    pub async fn load_cache(&self, store: &PhotoStore) {
        let raw = match self.kv.get(CACHE_KEY).await {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Failed to read cache snapshot, starting empty");
                return;
            }
        };

        match serde_json::from_str::<BTreeMap<DateKey, Vec<PhotoItem>>>(&raw) {
            Ok(snapshot) => {
                store.restore(snapshot);
                debug!(photos = store.len(), days = store.day_count(), "Cache snapshot loaded");
            }
            Err(err) => {
                warn!(error = %err, "Malformed cache snapshot, starting empty");
            }
        }
    }

    /// Persists the store's current contents
    pub async fn save_cache(&self, store: &PhotoStore) -> anyhow::Result<()> {
        let json = serde_json::to_string(&store.snapshot())?;
        self.kv.set(CACHE_KEY, &json).await
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Removes all persisted sync state (logout / account switch)
    pub async fn clear(&self) -> anyhow::Result<()> {
        self.kv.remove(LAST_SYNC_KEY).await?;
        self.kv.remove(HAS_MORE_KEY).await?;
        self.kv.remove(CACHE_KEY).await?;
        Ok(())
    }
}
