//! Integration tests for the sync manager
//!
//! Exercises the full fetch-filter-merge-bookkeep cycle against in-memory
//! fakes for every port. Timestamps are built at millisecond precision so
//! they survive the watermark's epoch-millis encoding unchanged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::watch;

use skinlog_cache::{PhotoStore, SyncStateStore};
use skinlog_core::config::SyncConfig;
use skinlog_core::domain::{OwnerId, SkipReason, SyncStatus};
use skinlog_core::ports::{
    Connectivity, IAuthSession, IKeyValueStore, IPhotoRepository, PhotoRecord,
};
use skinlog_sync::{LoadMoreOutcome, SyncManager, SyncOptions, SyncOutcome, WatchReachability};

// ============================================================================
// Port fakes
// ============================================================================

struct FakeAuth {
    owner: Option<OwnerId>,
}

impl IAuthSession for FakeAuth {
    fn current_user(&self) -> Option<OwnerId> {
        self.owner.clone()
    }
}

#[derive(Default)]
struct FakeRepository {
    records: Vec<PhotoRecord>,
    calls: AtomicUsize,
    delay: Option<StdDuration>,
    fail: bool,
}

#[async_trait::async_trait]
impl IPhotoRepository for FakeRepository {
    async fn list_by_owner(&self, _owner: &OwnerId) -> anyhow::Result<Vec<PhotoRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("simulated repository outage");
        }
        Ok(self.records.clone())
    }
}

#[derive(Default)]
struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl IKeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    manager: Arc<SyncManager>,
    state: Arc<SyncStateStore>,
    store: Arc<PhotoStore>,
    repository: Arc<FakeRepository>,
    #[allow(dead_code)]
    net: watch::Sender<Connectivity>,
}

fn harness(repository: FakeRepository, signed_in: bool, connectivity: Connectivity) -> Harness {
    let repository = Arc::new(repository);
    let auth = Arc::new(FakeAuth {
        owner: signed_in.then(|| OwnerId::new("user-1").unwrap()),
    });
    let (net, probe) = WatchReachability::new(connectivity);
    let store = Arc::new(PhotoStore::new(3));
    let state = Arc::new(SyncStateStore::new(Arc::new(MemoryKv::default())));
    let manager = Arc::new(SyncManager::new(
        repository.clone(),
        auth,
        Arc::new(probe),
        store.clone(),
        state.clone(),
        SyncConfig::default(),
    ));
    Harness {
        manager,
        state,
        store,
        repository,
        net,
    }
}

/// An instant `seconds_ago` before now, truncated to millisecond precision
fn ago(seconds: i64) -> DateTime<Utc> {
    let millis = Utc::now().timestamp_millis() - seconds * 1000;
    Utc.timestamp_millis_opt(millis).single().unwrap()
}

fn record(id: &str, created_at: DateTime<Utc>) -> PhotoRecord {
    PhotoRecord {
        id: id.to_string(),
        owner_id: "user-1".to_string(),
        date_key: created_at.date_naive().format("%Y-%m-%d").to_string(),
        url: format!("https://cdn.example/{id}.jpg"),
        created_at,
        local_id: None,
    }
}

fn unthrottled() -> SyncOptions {
    SyncOptions {
        force_sync: false,
        check_wifi: false,
    }
}

// ============================================================================
// Policy gating through the manager
// ============================================================================

#[tokio::test]
async fn test_recently_synced_skips_without_fetch() {
    let h = harness(FakeRepository::default(), true, Connectivity::Wifi);
    h.state.record_sync_time(ago(3600)).await.unwrap();
    let baseline = h.state.last_sync_time().await;

    let outcome = h.manager.sync_new_photos(unthrottled()).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::RecentlySynced));
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.state.last_sync_time().await, baseline);
}

#[tokio::test]
async fn test_force_sync_overrides_freshness() {
    let h = harness(FakeRepository::default(), true, Connectivity::Wifi);
    h.state.record_sync_time(ago(3600)).await.unwrap();

    let outcome = h.manager.sync_new_photos(SyncOptions::forced()).await;

    assert!(outcome.is_success());
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_offline_skips_sync_without_fetch() {
    let h = harness(FakeRepository::default(), true, Connectivity::Offline);

    let outcome = h.manager.sync_new_photos(SyncOptions::forced()).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::Offline));
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.state.last_sync_time().await, None);
}

#[tokio::test]
async fn test_offline_fails_pagination_without_fetch() {
    let h = harness(FakeRepository::default(), true, Connectivity::Offline);

    let outcome = h.manager.load_more_photos(Utc::now()).await;

    assert!(!outcome.is_success());
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cellular_throttled_inside_freshness_window() {
    let h = harness(FakeRepository::default(), true, Connectivity::Cellular);
    h.state.record_sync_time(ago(3600)).await.unwrap();

    let outcome = h.manager.sync_new_photos(SyncOptions::default()).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::MobileNetwork));
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_signed_out_fails_hard() {
    let h = harness(FakeRepository::default(), false, Connectivity::Wifi);

    let sync = h.manager.sync_new_photos(SyncOptions::forced()).await;
    assert!(matches!(
        sync,
        SyncOutcome::Failed { .. }
    ));
    assert_eq!(sync.skip_reason(), None);

    let page = h.manager.load_more_photos(Utc::now()).await;
    assert!(!page.is_success());
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Incremental sync behavior
// ============================================================================

#[tokio::test]
async fn test_sync_merges_and_advances_watermark_to_max_observed() {
    let newest = ago(60);
    let repo = FakeRepository {
        records: vec![
            record("r1", ago(7200)),
            record("r2", ago(300)),
            record("r3", newest),
        ],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.sync_new_photos(SyncOptions::default()).await;

    let SyncOutcome::Completed { new_photos } = outcome else {
        panic!("expected completed sync");
    };
    assert_eq!(new_photos.len(), 3);
    assert_eq!(new_photos[0].id, "r3");
    assert_eq!(h.store.len(), 3);

    // Watermark lands on the newest observed instant minus the backoff,
    // not on wall-clock now.
    assert_eq!(
        h.state.last_sync_time().await,
        Some(newest - Duration::seconds(5))
    );
}

#[tokio::test]
async fn test_sync_filters_to_watermark_and_caps_at_fifty() {
    let mut records = Vec::new();
    // One record already behind the watermark, sixty ahead of it.
    records.push(record("stale", ago(7 * 24 * 3600)));
    for i in 0..60 {
        records.push(record(&format!("n{i}"), ago(3600 - i)));
    }
    let repo = FakeRepository {
        records,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);
    h.state.record_sync_time(ago(2 * 24 * 3600)).await.unwrap();

    let outcome = h.manager.sync_new_photos(unthrottled()).await;

    let SyncOutcome::Completed { new_photos } = outcome else {
        panic!("expected completed sync");
    };
    assert_eq!(new_photos.len(), 50);
    // Newest first: n59 was created most recently.
    assert_eq!(new_photos[0].id, "n59");
    assert!(new_photos.iter().all(|r| r.id != "stale"));
}

#[tokio::test]
async fn test_fetch_error_leaves_watermark_and_cache_untouched() {
    let repo = FakeRepository {
        fail: true,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.sync_new_photos(SyncOptions::forced()).await;

    assert!(matches!(
        outcome,
        SyncOutcome::Failed { .. }
    ));
    assert_eq!(h.state.last_sync_time().await, None);
    assert!(h.store.is_empty());
    assert_eq!(h.manager.status(), SyncStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_skip_and_watermark_untouched() {
    let repo = FakeRepository {
        delay: Some(StdDuration::from_secs(30)),
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.sync_new_photos(SyncOptions::forced()).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::Timeout));
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.state.last_sync_time().await, None);
    assert_eq!(h.manager.status(), SyncStatus::Idle);
}

#[tokio::test]
async fn test_repeat_sync_is_idempotent_on_cache() {
    let repo = FakeRepository {
        records: vec![record("r1", ago(120)), record("r2", ago(60))],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    assert!(h.manager.sync_new_photos(SyncOptions::forced()).await.is_success());
    let len_after_first = h.store.len();
    assert!(h.manager.sync_new_photos(SyncOptions::forced()).await.is_success());

    assert_eq!(h.store.len(), len_after_first);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_triggers_coalesce_to_one_fetch() {
    let repo = FakeRepository {
        records: vec![record("r1", ago(60))],
        delay: Some(StdDuration::from_secs(1)),
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let (a, b) = tokio::join!(
        h.manager.sync_new_photos(SyncOptions::forced()),
        h.manager.sync_new_photos(SyncOptions::forced()),
    );

    assert!(a.is_success());
    assert_eq!(a, b);
    assert_eq!(h.repository.calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Pagination behavior
// ============================================================================

#[tokio::test]
async fn test_full_page_reports_more_history() {
    let records: Vec<PhotoRecord> = (0..95)
        .map(|i| record(&format!("h{i}"), ago(10 * 24 * 3600 + i * 60)))
        .collect();
    let repo = FakeRepository {
        records,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.load_more_photos(ago(24 * 3600)).await;

    let LoadMoreOutcome::Completed { photos, has_more } = outcome else {
        panic!("expected completed pagination");
    };
    assert_eq!(photos.len(), 90);
    assert!(has_more);
    assert!(h.state.has_more_history().await);
}

#[tokio::test]
async fn test_short_page_exhausts_history() {
    let records: Vec<PhotoRecord> = (0..89)
        .map(|i| record(&format!("h{i}"), ago(10 * 24 * 3600 + i * 60)))
        .collect();
    let repo = FakeRepository {
        records,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.load_more_photos(ago(24 * 3600)).await;

    let LoadMoreOutcome::Completed { photos, has_more } = outcome else {
        panic!("expected completed pagination");
    };
    assert_eq!(photos.len(), 89);
    assert!(!has_more);
    assert!(!h.state.has_more_history().await);
}

#[tokio::test]
async fn test_pagination_never_touches_watermark() {
    let repo = FakeRepository {
        records: vec![record("h1", ago(10 * 24 * 3600))],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);
    h.state.record_sync_time(ago(600)).await.unwrap();
    let baseline = h.state.last_sync_time().await;

    assert!(h.manager.load_more_photos(ago(3600)).await.is_success());

    assert_eq!(h.state.last_sync_time().await, baseline);
}

#[tokio::test]
async fn test_pagination_appends_beyond_daily_cap() {
    // Five photos on one historical day: all displayed, cap applies only
    // to the recent-capture path.
    let day_base = 10 * 24 * 3600;
    let records: Vec<PhotoRecord> = (0..5)
        .map(|i| record(&format!("h{i}"), ago(day_base + i * 60)))
        .collect();
    let repo = FakeRepository {
        records,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    assert!(h.manager.load_more_photos(ago(3600)).await.is_success());

    assert_eq!(h.store.len(), 5);
}

// ============================================================================
// Bootstrap behavior
// ============================================================================

#[tokio::test]
async fn test_bootstrap_seeds_cache_and_bookkeeping() {
    let records = vec![
        record("r1", ago(60)),
        record("r2", ago(24 * 3600)),
        record("r3", ago(24 * 3600 + 60)),
        record("r4", ago(2 * 24 * 3600)),
        record("r5", ago(2 * 24 * 3600 + 60)),
    ];
    let repo = FakeRepository {
        records,
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let before = Utc::now();
    let outcome = h.manager.first_time_sync().await;

    let SyncOutcome::Completed { new_photos } = outcome else {
        panic!("expected completed bootstrap");
    };
    assert_eq!(new_photos.len(), 5);
    assert_eq!(h.store.day_count(), 3);

    let flat = h.store.flatten_chronological();
    assert_eq!(flat.len(), 5);
    assert!(flat.windows(2).all(|w| w[0].created_at() >= w[1].created_at()));

    // Watermark approximately "now": the newest record minus the backoff.
    let watermark = h.state.last_sync_time().await.expect("watermark set");
    assert!(before - watermark < Duration::seconds(120));
    assert!(h.state.has_more_history().await);
}

#[tokio::test]
async fn test_bootstrap_excludes_records_older_than_window() {
    let repo = FakeRepository {
        records: vec![
            record("recent", ago(24 * 3600)),
            record("ancient", ago(45 * 24 * 3600)),
        ],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    let outcome = h.manager.first_time_sync().await;

    let SyncOutcome::Completed { new_photos } = outcome else {
        panic!("expected completed bootstrap");
    };
    assert_eq!(new_photos.len(), 1);
    assert_eq!(new_photos[0].id, "recent");
}

#[tokio::test]
async fn test_bootstrap_offline_is_skip() {
    let h = harness(FakeRepository::default(), true, Connectivity::Offline);

    let outcome = h.manager.first_time_sync().await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::Offline));
    assert_eq!(h.state.last_sync_time().await, None);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_returns_to_never_synced() {
    let repo = FakeRepository {
        records: vec![record("r1", ago(60))],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);

    assert!(h.manager.first_time_sync().await.is_success());
    assert!(h.state.last_sync_time().await.is_some());
    assert!(!h.store.is_empty());

    h.manager.reset().await;

    assert_eq!(h.state.last_sync_time().await, None);
    assert!(h.state.has_more_history().await);
    assert!(h.store.is_empty());
    assert_eq!(h.manager.status(), SyncStatus::Idle);
}

// ============================================================================
// Status publication
// ============================================================================

#[tokio::test]
async fn test_status_returns_to_idle_after_success() {
    let repo = FakeRepository {
        records: vec![record("r1", ago(60))],
        ..Default::default()
    };
    let h = harness(repo, true, Connectivity::Wifi);
    let status_rx = h.manager.subscribe_status();

    assert_eq!(h.manager.status(), SyncStatus::Idle);
    assert!(h.manager.sync_new_photos(SyncOptions::forced()).await.is_success());

    assert_eq!(h.manager.status(), SyncStatus::Idle);
    assert_eq!(*status_rx.borrow(), SyncStatus::Idle);
}
