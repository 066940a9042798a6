//! Sync vocabulary shared between the engine and its observers
//!
//! These types carry no behavior beyond classification. The sync engine
//! mutates them; the UI only observes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a sync attempt was skipped without touching the network or watermark
///
/// Skips are not errors: the caller may silently ignore or log them and
/// retry on the next trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No network connectivity
    Offline,
    /// On cellular with the freshness threshold not yet elapsed
    MobileNetwork,
    /// Freshness threshold not yet elapsed since the last sync
    RecentlySynced,
    /// The fetch did not complete within the sync timeout
    Timeout,
}

impl SkipReason {
    /// Stable string form, matching the serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Offline => "offline",
            SkipReason::MobileNetwork => "mobile_network",
            SkipReason::RecentlySynced => "recently_synced",
            SkipReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global sync activity state, published for progress indicators
///
/// A single value per process, mutated only by the sync engine. This is
/// advisory for display purposes; mutual exclusion of sync operations is
/// enforced separately by the engine's single-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No sync activity
    #[default]
    Idle,
    /// An incremental or bootstrap sync is running
    Syncing,
    /// A backward pagination fetch is running
    LoadingMore,
    /// The most recent operation failed
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::LoadingMore => write!(f, "loading_more"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}
