//! Day-bucketed photo store
//!
//! The [`PhotoStore`] merges local captures and remote sync results under
//! the per-day cap policy and exposes the derived views the UI renders
//! (flattened chronological list, per-day lookup, streak computation).
//!
//! ## Concurrency
//!
//! Buckets live in a [`DashMap`] keyed by calendar day; every mutation is
//! a read-modify-write on a single day's vector under that entry's lock,
//! which gives the per-bucket atomicity the sync model requires. There is
//! no cross-bucket transaction.
//!
//! ## Ordering and the cap
//!
//! Buckets are kept sorted newest-first by capture instant, and inserts
//! truncate to the cap, so the photos retained for a day are always the
//! most recent among all added. Backward pagination is exempt: the cap is
//! a recent-capture policy, not a historical-display limit, so
//! [`PhotoStore::append_older`] never evicts.

use std::collections::BTreeMap;

use dashmap::DashMap;
use tracing::{debug, warn};

use skinlog_core::domain::{DateKey, PhotoId, PhotoItem};
use skinlog_core::ports::PhotoRecord;

/// In-memory day-bucketed photo cache
///
/// Cheap to share: all methods take `&self`, so consumers hold it in an
/// `Arc` and mutate through the defined operations only.
pub struct PhotoStore {
    buckets: DashMap<DateKey, Vec<PhotoItem>>,
    daily_cap: usize,
}

impl PhotoStore {
    /// Creates an empty store with the given per-day cap
    #[must_use]
    pub fn new(daily_cap: usize) -> Self {
        Self {
            buckets: DashMap::new(),
            daily_cap,
        }
    }

    /// The configured per-day cap
    pub fn daily_cap(&self) -> usize {
        self.daily_cap
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Adds a photo to its day bucket, evicting the oldest beyond the cap
    ///
    /// Used for freshly captured local photos before upload confirms.
    pub fn add_photo(&self, item: PhotoItem) {
        let key = item.date_key();
        let mut bucket = self.buckets.entry(key).or_default();
        insert_newest_first(&mut bucket, item);
        bucket.truncate(self.daily_cap);
    }

    /// Replaces a photo's URI after its upload has been confirmed
    ///
    /// Locates the item by ID across all buckets, swaps in the cloud URL
    /// and marks it uploaded. Silently does nothing if the ID is unknown
    /// (the photo may have been evicted while the upload was in flight).
    pub fn update_photo_uri(&self, id: &PhotoId, new_uri: &str) {
        for mut entry in self.buckets.iter_mut() {
            if let Some(item) = entry.value_mut().iter_mut().find(|p| p.id() == id) {
                item.confirm_upload(new_uri);
                return;
            }
        }
        debug!(photo_id = %id, "update_photo_uri: id not present, ignoring");
    }

    /// Merges remote records from an incremental or bootstrap sync
    ///
    /// Records are processed newest-first for deterministic within-day
    /// ordering. A record whose ID already exists in its day's bucket is
    /// skipped, which makes the merge idempotent. Returns the number of
    /// records actually inserted.
    pub fn merge_synced(&self, records: &[PhotoRecord]) -> usize {
        let mut ordered: Vec<&PhotoRecord> = records.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut inserted = 0;
        for record in ordered {
            let Some(item) = item_from_record(record) else {
                continue;
            };
            let mut bucket = self.buckets.entry(item.date_key()).or_default();
            if bucket.iter().any(|p| p.id() == item.id()) {
                continue;
            }
            insert_newest_first(&mut bucket, item);
            bucket.truncate(self.daily_cap);
            inserted += 1;
        }
        inserted
    }

    /// Appends older records fetched by backward pagination
    ///
    /// Same ID-based de-duplication as [`merge_synced`](Self::merge_synced),
    /// but exempt from the daily cap: history already on the server is
    /// displayed in full. Returns the number of records inserted.
    pub fn append_older(&self, records: &[PhotoRecord]) -> usize {
        let mut inserted = 0;
        for record in records {
            let Some(item) = item_from_record(record) else {
                continue;
            };
            let mut bucket = self.buckets.entry(item.date_key()).or_default();
            if bucket.iter().any(|p| p.id() == item.id()) {
                continue;
            }
            bucket.push(item);
            inserted += 1;
        }
        inserted
    }

    /// Removes a photo by ID, pruning its bucket if it becomes empty
    ///
    /// Returns whether anything was removed.
    pub fn remove_photo(&self, id: &PhotoId) -> bool {
        let mut owner = None;
        for mut entry in self.buckets.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|p| p.id() != id);
            if entry.value().len() != before {
                owner = Some(*entry.key());
                break;
            }
        }
        match owner {
            Some(key) => {
                self.buckets.remove_if(&key, |_, items| items.is_empty());
                true
            }
            None => false,
        }
    }

    /// Drops all buckets (logout / account switch)
    pub fn clear(&self) {
        self.buckets.clear();
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// The photos for one calendar day, newest first
    pub fn photos_for_day(&self, key: &DateKey) -> Vec<PhotoItem> {
        self.buckets
            .get(key)
            .map(|bucket| bucket.clone())
            .unwrap_or_default()
    }

    /// All photos across all days, newest first
    ///
    /// Pure and recomputed on read; ties on the capture instant break by
    /// ID so repeated reads of the same state agree.
    pub fn flatten_chronological(&self) -> Vec<PhotoItem> {
        let mut all: Vec<PhotoItem> = self
            .buckets
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        all
    }

    /// Consecutive days with at least one photo, walking back from `today`
    ///
    /// Stops at the first empty day; bounded to 7.
    pub fn week_streak(&self, today: DateKey) -> u32 {
        let mut streak = 0;
        let mut day = Some(today);
        for _ in 0..7 {
            let Some(current) = day else { break };
            let populated = self
                .buckets
                .get(&current)
                .map(|bucket| !bucket.is_empty())
                .unwrap_or(false);
            if !populated {
                break;
            }
            streak += 1;
            day = current.pred();
        }
        streak
    }

    /// Total photos across all buckets
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|entry| entry.value().len()).sum()
    }

    /// Whether the store holds no photos
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-empty day buckets
    pub fn day_count(&self) -> usize {
        self.buckets.len()
    }

    // ------------------------------------------------------------------
    // Persistence support
    // ------------------------------------------------------------------

    /// A sorted copy of the bucket map, for serialization
    pub fn snapshot(&self) -> BTreeMap<DateKey, Vec<PhotoItem>> {
        self.buckets
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Replaces the store contents with a previously serialized snapshot
    ///
    /// Buckets are re-sorted and re-capped on the way in so a snapshot
    /// written under an older cap setting still honors the current one.
    /// Pagination overflow beyond the cap is preserved as written.
    pub fn restore(&self, snapshot: BTreeMap<DateKey, Vec<PhotoItem>>) {
        self.buckets.clear();
        for (key, mut items) in snapshot {
            items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
            if !items.is_empty() {
                self.buckets.insert(key, items);
            }
        }
    }
}

/// Inserts keeping the bucket sorted newest-first by capture instant
///
/// Equal instants preserve arrival order among themselves.
fn insert_newest_first(bucket: &mut Vec<PhotoItem>, item: PhotoItem) {
    let pos = bucket
        .iter()
        .position(|existing| existing.created_at() < item.created_at())
        .unwrap_or(bucket.len());
    bucket.insert(pos, item);
}

/// Maps a remote record to a cache item, skipping undecodable IDs
fn item_from_record(record: &PhotoRecord) -> Option<PhotoItem> {
    match record.photo_id() {
        Ok(id) => Some(PhotoItem::from_remote(
            id,
            record.url.clone(),
            record.date_key_or_created(),
            record.created_at,
        )),
        Err(err) => {
            warn!(error = %err, "Dropping remote record with unusable ID");
            None
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================
