//! Photo repository port (driven/secondary port)
//!
//! This module defines the interface for the remote photo document store.
//! The primary implementation targets Firestore via its REST API, but the
//! trait is provider-agnostic.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - The `PhotoRecord` struct is a port-level DTO, not a domain entity;
//!   the cache layer is responsible for mapping it to `PhotoItem`.
//! - The listing is a single-field owner filter only. The backing store is
//!   not indexed for server-side timestamp ranges, so watermark and
//!   pagination range filtering happen client-side on the full listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{DateKey, OwnerId, PhotoId};

/// A single photo document from the remote repository
///
/// This is a port-level DTO representing raw data from the document store.
/// Records are immutable once the external scoring collaborator has
/// attached its analysis; this subsystem only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Document identifier, the photo's identity
    pub id: String,
    /// Owner the photo belongs to
    pub owner_id: String,
    /// Calendar day in `YYYY-MM-DD` form
    pub date_key: String,
    /// Public URL of the stored image
    pub url: String,
    /// Upload instant
    pub created_at: DateTime<Utc>,
    /// The capturing device's local identifier, when the photo originated
    /// on this or another device (None for web uploads)
    pub local_id: Option<String>,
}

impl PhotoRecord {
    /// The record's identifier as a typed [`PhotoId`]
    ///
    /// # Errors
    ///
    /// Fails if the document identifier is empty.
    pub fn photo_id(&self) -> Result<PhotoId, crate::domain::DomainError> {
        PhotoId::new(self.id.clone())
    }

    /// The record's calendar day, falling back to the `created_at` date
    /// when the stored `date_key` field is malformed
    ///
    /// A bad date key must not poison the merge path; the upload instant
    /// is always present and close enough.
    pub fn date_key_or_created(&self) -> DateKey {
        self.date_key
            .parse()
            .unwrap_or_else(|_| DateKey::from_datetime(&self.created_at))
    }
}

/// Port trait for the remote photo document store
///
/// ## Implementation Notes
///
/// - `list_by_owner` returns *all* of the owner's records in no guaranteed
///   order; callers filter, sort, and cap client-side.
/// - There is no pagination token; the per-user record count is assumed
///   small enough for a full listing. This is a known scalability ceiling.
#[async_trait::async_trait]
pub trait IPhotoRepository: Send + Sync {
    /// Lists every photo record owned by `owner`
    ///
    /// # Errors
    ///
    /// Returns an error on network or decode failure; never partially
    /// succeeds silently.
    async fn list_by_owner(&self, owner: &OwnerId) -> anyhow::Result<Vec<PhotoRecord>>;
}
