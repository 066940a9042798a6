//! Photo synchronization manager
//!
//! Orchestrates the three fetch operations against the remote photo
//! repository and reconciles their results into the local cache:
//!
//! 1. **Incremental sync** - records newer than the watermark, gated by
//!    the sync policy, raced against a timeout
//! 2. **Backward pagination** - records older than a point, for
//!    infinite-scroll history loading
//! 3. **First-run bootstrap** - a bounded recent window when no watermark
//!    exists yet
//!
//! ## Failure semantics
//!
//! No operation returns `Err` or panics across this boundary: every path
//! ends in a discriminated outcome. Skips and timeouts leave the
//! watermark and cache untouched, so the caller can retry on the next
//! trigger.
//!
//! ## Single flight
//!
//! Concurrent sync triggers (auto-sync and pull-to-refresh firing close
//! together) share one in-flight operation: the first caller runs the
//! fetch, later callers await the same shared future and receive its
//! outcome. The watermark therefore cannot be advanced twice for one
//! remote snapshot, and no duplicate fetch is issued.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use skinlog_cache::{PhotoStore, SyncStateStore};
use skinlog_core::config::SyncConfig;
use skinlog_core::domain::{SkipReason, SyncStatus};
use skinlog_core::ports::{IAuthSession, IPhotoRepository, IReachabilityProbe, PhotoRecord};

use crate::policy::{self, Decision, PolicyContext, SyncOptions};

// ============================================================================
// Operation outcomes
// ============================================================================

/// Outcome of an incremental or bootstrap sync
///
/// `Clone` so coalesced callers can share one result.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The fetch ran; `new_photos` are the records merged into the cache,
    /// newest first
    Completed { new_photos: Vec<PhotoRecord> },
    /// The attempt was gated off or timed out; nothing changed
    Skipped(SkipReason),
    /// The attempt failed; nothing changed
    Failed { error: String },
}

impl SyncOutcome {
    /// True only for a completed sync
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Completed { .. })
    }

    /// The skip reason, if the attempt was skipped
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            SyncOutcome::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Outcome of a backward pagination fetch
///
/// Pagination is user-initiated, so gating violations surface as
/// failures rather than silent skips.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadMoreOutcome {
    /// The page that was fetched and appended, plus whether more history
    /// may remain
    Completed {
        photos: Vec<PhotoRecord>,
        has_more: bool,
    },
    /// The fetch could not run or failed
    Failed { error: String },
}

impl LoadMoreOutcome {
    /// True only for a completed fetch
    pub fn is_success(&self) -> bool {
        matches!(self, LoadMoreOutcome::Completed { .. })
    }
}

type SharedSync = Shared<BoxFuture<'static, SyncOutcome>>;

// ============================================================================
// SyncManager
// ============================================================================

/// The photo synchronization service
///
/// Constructed once per process; clones share the same cache, persisted
/// bookkeeping, status channel, and single-flight slot, so it can be
/// handed to every UI surface that triggers syncs.
#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<Inner>,
}

struct Inner {
    repository: Arc<dyn IPhotoRepository>,
    auth: Arc<dyn IAuthSession>,
    reachability: Arc<dyn IReachabilityProbe>,
    store: Arc<PhotoStore>,
    state: Arc<SyncStateStore>,
    config: SyncConfig,
    status_tx: watch::Sender<SyncStatus>,
    /// Single-flight slot for sync operations
    in_flight: Mutex<Option<SharedSync>>,
}

impl SyncManager {
    /// Creates a new manager over the given ports and stores
    pub fn new(
        repository: Arc<dyn IPhotoRepository>,
        auth: Arc<dyn IAuthSession>,
        reachability: Arc<dyn IReachabilityProbe>,
        store: Arc<PhotoStore>,
        state: Arc<SyncStateStore>,
        config: SyncConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                repository,
                auth,
                reachability,
                store,
                state,
                config,
                status_tx,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// The cache this manager reconciles into
    pub fn store(&self) -> &Arc<PhotoStore> {
        &self.inner.store
    }

    /// The persisted sync bookkeeping (watermark, more-history flag)
    pub fn state(&self) -> &Arc<SyncStateStore> {
        &self.inner.state
    }

    /// Current sync activity state
    pub fn status(&self) -> SyncStatus {
        *self.inner.status_tx.borrow()
    }

    /// Subscribes to sync activity changes, for progress indicators
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Incremental sync
    // ------------------------------------------------------------------

    /// Fetches records newer than the watermark and merges them
    ///
    /// Policy-gated (see [`crate::policy`]); raced against the configured
    /// timeout. Concurrent callers coalesce onto one in-flight operation
    /// and all receive its outcome; the leader's options win.
    pub async fn sync_new_photos(&self, options: SyncOptions) -> SyncOutcome {
        self.single_flight(move |this| {
            async move {
                this.publish(SyncStatus::Syncing);
                let outcome = this.incremental_inner(options).await;
                this.finish(&outcome);
                outcome
            }
            .boxed()
        })
        .await
    }

    async fn incremental_inner(&self, options: SyncOptions) -> SyncOutcome {
        let owner = self.inner.auth.current_user();
        let connectivity = self.inner.reachability.current().await;
        let now = Utc::now();
        let last_sync = self.inner.state.last_sync_time().await;

        let ctx = PolicyContext {
            authenticated: owner.is_some(),
            connectivity,
            last_sync,
            now,
            freshness_threshold: self.inner.config.auto_sync_interval(),
        };
        match policy::decide(&ctx, &options) {
            Err(err) => {
                warn!(error = %err, "Sync precondition failed");
                return SyncOutcome::Failed {
                    error: err.to_string(),
                };
            }
            Ok(Decision::Skip(reason)) => {
                debug!(reason = %reason, "Sync skipped by policy");
                return SyncOutcome::Skipped(reason);
            }
            Ok(Decision::Proceed) => {}
        }
        let Some(owner) = owner else {
            // decide() already rejects this; kept for panic freedom
            return SyncOutcome::Failed {
                error: "No authenticated session".to_string(),
            };
        };

        // Bootstrap fallback: with no watermark, look back over the
        // configured first-load window.
        let after = last_sync.unwrap_or(now - self.inner.config.first_load_window());
        info!(owner = %owner, after = %after, "Starting incremental sync");

        let fetched = match tokio::time::timeout(
            self.inner.config.sync_timeout(),
            self.inner.repository.list_by_owner(&owner),
        )
        .await
        {
            Err(_) => {
                warn!(
                    timeout_secs = self.inner.config.sync_timeout_secs,
                    "Incremental sync timed out"
                );
                return SyncOutcome::Skipped(SkipReason::Timeout);
            }
            Ok(Err(err)) => {
                error!(error = %format!("{err:#}"), "Incremental sync fetch failed");
                return SyncOutcome::Failed {
                    error: format!("{err:#}"),
                };
            }
            Ok(Ok(records)) => records,
        };

        let new_photos = filter_after(fetched, after, self.inner.config.incremental_fetch_limit);
        let merged = self.inner.store.merge_synced(&new_photos);
        self.persist_cache().await;
        self.advance_watermark(&new_photos, now).await;

        info!(fetched = new_photos.len(), merged, "Incremental sync complete");
        SyncOutcome::Completed { new_photos }
    }

    // ------------------------------------------------------------------
    // Backward pagination
    // ------------------------------------------------------------------

    /// Fetches records older than `before` and appends them to the cache
    ///
    /// User-initiated: requires a session and connectivity, and reports
    /// violations as failures. Does not touch the watermark: pagination
    /// is orthogonal to newest-side tracking.
    pub async fn load_more_photos(&self, before: DateTime<Utc>) -> LoadMoreOutcome {
        let Some(owner) = self.inner.auth.current_user() else {
            return LoadMoreOutcome::Failed {
                error: "No authenticated session".to_string(),
            };
        };
        if !self.inner.reachability.current().await.is_online() {
            return LoadMoreOutcome::Failed {
                error: "No network connection".to_string(),
            };
        }

        self.publish(SyncStatus::LoadingMore);
        info!(owner = %owner, before = %before, "Loading older photos");

        let fetched = match self.inner.repository.list_by_owner(&owner).await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %format!("{err:#}"), "Pagination fetch failed");
                self.publish(SyncStatus::Error);
                return LoadMoreOutcome::Failed {
                    error: format!("{err:#}"),
                };
            }
        };

        let photos = filter_before(fetched, before, self.inner.config.page_size);

        // Heuristic: a full page suggests more history remains. A history
        // whose true size is an exact multiple of the page size costs one
        // extra empty fetch.
        let has_more = photos.len() == self.inner.config.page_size;
        if let Err(err) = self.inner.state.set_has_more_history(has_more).await {
            warn!(error = %err, "Failed to persist history flag");
        }

        let appended = self.inner.store.append_older(&photos);
        self.persist_cache().await;
        self.publish(SyncStatus::Idle);

        info!(fetched = photos.len(), appended, has_more, "Pagination complete");
        LoadMoreOutcome::Completed { photos, has_more }
    }

    // ------------------------------------------------------------------
    // First-run bootstrap
    // ------------------------------------------------------------------

    /// Seeds the cache with the recent window when no watermark exists
    ///
    /// Gated on session and connectivity only; freshness does not apply
    /// to a first run. Marks history as available unconditionally: the
    /// bounded window says nothing about what lies beyond it.
    pub async fn first_time_sync(&self) -> SyncOutcome {
        self.single_flight(|this| {
            async move {
                this.publish(SyncStatus::Syncing);
                let outcome = this.bootstrap_inner().await;
                this.finish(&outcome);
                outcome
            }
            .boxed()
        })
        .await
    }

    async fn bootstrap_inner(&self) -> SyncOutcome {
        let Some(owner) = self.inner.auth.current_user() else {
            return SyncOutcome::Failed {
                error: "No authenticated session".to_string(),
            };
        };
        if !self.inner.reachability.current().await.is_online() {
            return SyncOutcome::Skipped(SkipReason::Offline);
        }

        let now = Utc::now();
        let window_start = now - self.inner.config.first_load_window();
        info!(owner = %owner, since = %window_start, "First-time sync");

        let fetched = match self.inner.repository.list_by_owner(&owner).await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %format!("{err:#}"), "First-time sync fetch failed");
                return SyncOutcome::Failed {
                    error: format!("{err:#}"),
                };
            }
        };

        let new_photos = filter_after(fetched, window_start, self.inner.config.bootstrap_fetch_limit);
        let merged = self.inner.store.merge_synced(&new_photos);
        self.persist_cache().await;
        self.advance_watermark(&new_photos, now).await;

        if let Err(err) = self.inner.state.set_has_more_history(true).await {
            warn!(error = %err, "Failed to persist history flag");
        }

        info!(fetched = new_photos.len(), merged, "First-time sync complete");
        SyncOutcome::Completed { new_photos }
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Drops the cache and all persisted sync state (logout, account switch)
    ///
    /// The watermark reads as never-synced afterwards, so the next sign-in
    /// starts from the first-run bootstrap. Storage failures are logged;
    /// the in-memory cache is cleared regardless.
    pub async fn reset(&self) {
        self.inner.store.clear();
        if let Err(err) = self.inner.state.clear().await {
            warn!(error = %err, "Failed to clear persisted sync state");
        }
        self.publish(SyncStatus::Idle);
        info!("Sync state reset");
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Runs `build` as the single in-flight sync, or joins the one running
    async fn single_flight(
        &self,
        build: impl FnOnce(SyncManager) -> BoxFuture<'static, SyncOutcome>,
    ) -> SyncOutcome {
        let (operation, leader) = {
            let mut slot = lock_in_flight(&self.inner.in_flight);
            match slot.as_ref() {
                // Still pending: join it.
                Some(existing) if existing.peek().is_none() => {
                    debug!("Joining in-flight sync");
                    (existing.clone(), false)
                }
                // Empty or completed: start fresh.
                _ => {
                    let shared = build(self.clone()).shared();
                    *slot = Some(shared.clone());
                    (shared, true)
                }
            }
        };

        let outcome = operation.await;

        if leader {
            let mut slot = lock_in_flight(&self.inner.in_flight);
            // Only clear our own completed future; a newer pending one
            // stays in place.
            if slot
                .as_ref()
                .is_some_and(|existing| existing.peek().is_some())
            {
                *slot = None;
            }
        }

        outcome
    }

    /// Advances the watermark after a successful fetch
    ///
    /// Targets the newest instant actually observed, minus a safety
    /// backoff: a record committed with a slightly earlier server
    /// timestamp than anything fetched here still lands inside the next
    /// cycle's window, and the idempotent merge absorbs the re-fetched
    /// overlap. An empty fetch falls back to the fetch instant. The state
    /// store clamps regressions, keeping the watermark monotonic.
    async fn advance_watermark(&self, fetched: &[PhotoRecord], now: DateTime<Utc>) {
        let observed_max = fetched.iter().map(|r| r.created_at).max();
        let next = observed_max.unwrap_or(now) - self.inner.config.watermark_backoff();
        if let Err(err) = self.inner.state.record_sync_time(next).await {
            warn!(error = %err, "Failed to persist watermark");
        }
    }

    /// Persists the cache snapshot, logging rather than failing the sync
    async fn persist_cache(&self) {
        if let Err(err) = self.inner.state.save_cache(&self.inner.store).await {
            warn!(error = %err, "Failed to persist cache snapshot");
        }
    }

    fn publish(&self, status: SyncStatus) {
        // send() only errs with no receivers; status is fire-and-forget.
        let _ = self.inner.status_tx.send(status);
    }

    fn finish(&self, outcome: &SyncOutcome) {
        self.publish(match outcome {
            SyncOutcome::Failed { .. } => SyncStatus::Error,
            _ => SyncStatus::Idle,
        });
    }
}

/// Locks the single-flight slot, recovering from a poisoned lock
fn lock_in_flight(slot: &Mutex<Option<SharedSync>>) -> MutexGuard<'_, Option<SharedSync>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// Client-side range filtering
// ============================================================================
//
// The repository listing is owner-filtered only (no server-side timestamp
// range without a composite index), so the range boundary, ordering, and
// cap are applied here on the full listing.

/// Records strictly newer than `after`, newest first, at most `limit`
fn filter_after(
    records: Vec<PhotoRecord>,
    after: DateTime<Utc>,
    limit: usize,
) -> Vec<PhotoRecord> {
    let mut out: Vec<PhotoRecord> = records
        .into_iter()
        .filter(|r| r.created_at > after)
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out.truncate(limit);
    out
}

/// Records strictly older than `before`, newest first, at most `limit`
fn filter_before(
    records: Vec<PhotoRecord>,
    before: DateTime<Utc>,
    limit: usize,
) -> Vec<PhotoRecord> {
    let mut out: Vec<PhotoRecord> = records
        .into_iter()
        .filter(|r| r.created_at < before)
        .collect();
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    out.truncate(limit);
    out
}

// ============================================================================
// Unit tests
// ============================================================================
