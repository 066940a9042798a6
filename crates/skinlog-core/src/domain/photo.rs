//! PhotoItem domain entity
//!
//! A `PhotoItem` is one photo as the local cache sees it: either a fresh
//! local capture awaiting upload, or a record merged from the remote
//! repository. The only permitted mutation is the local-pending to
//! cloud-confirmed transition via [`PhotoItem::confirm_upload`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{DateKey, PhotoId};

/// A single photo in the local cache
///
/// Created by local capture ([`PhotoItem::captured`], `uploaded = false`,
/// `uri` pointing at a local file) or by merging a remote record
/// ([`PhotoItem::from_remote`], `uploaded = true`, `uri` = cloud URL).
/// Destroyed only by cap eviction or explicit removal by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoItem {
    id: PhotoId,
    uri: String,
    date_key: DateKey,
    created_at: DateTime<Utc>,
    cloud_url: Option<String>,
    uploaded: bool,
}

impl PhotoItem {
    /// Creates a PhotoItem for a freshly captured local photo
    ///
    /// The item gets a generated ID and starts in the not-yet-uploaded
    /// state with `uri` referencing the local file.
    #[must_use]
    pub fn captured(uri: impl Into<String>, date_key: DateKey, created_at: DateTime<Utc>) -> Self {
        Self {
            id: PhotoId::generate(),
            uri: uri.into(),
            date_key,
            created_at,
            cloud_url: None,
            uploaded: false,
        }
    }

    /// Creates a PhotoItem from remote record fields
    ///
    /// Remote items are already uploaded; their `uri` is the cloud URL.
    #[must_use]
    pub fn from_remote(
        id: PhotoId,
        url: impl Into<String>,
        date_key: DateKey,
        created_at: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        Self {
            id,
            uri: url.clone(),
            date_key,
            created_at,
            cloud_url: Some(url),
            uploaded: true,
        }
    }

    // --- Getters ---

    /// The photo's identifier
    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    /// The URI the UI should render (local file or cloud URL)
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The calendar day this photo belongs to
    pub fn date_key(&self) -> DateKey {
        self.date_key
    }

    /// When the photo was taken
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The cloud URL, once upload has been confirmed
    pub fn cloud_url(&self) -> Option<&str> {
        self.cloud_url.as_deref()
    }

    /// Whether the photo has been confirmed uploaded
    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    // --- Transitions ---

    /// Marks a local-pending photo as uploaded to the given cloud URL
    ///
    /// Replaces `uri` with the cloud URL so subsequent renders hit the
    /// remote copy.
    pub fn confirm_upload(&mut self, cloud_url: impl Into<String>) {
        let cloud_url = cloud_url.into();
        self.uri = cloud_url.clone();
        self.cloud_url = Some(cloud_url);
        self.uploaded = true;
    }
}
