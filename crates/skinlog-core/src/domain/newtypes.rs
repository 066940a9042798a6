//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and
//! values. Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// DateKey
// ============================================================================

/// A calendar day in `YYYY-MM-DD` form, used to key daily photo buckets
///
/// Wraps a [`NaiveDate`] so arithmetic (previous day, ordering) stays in
/// calendar space rather than string space. Serializes as the ISO string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Create a DateKey from a calendar date
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Derive the DateKey for an instant, in UTC
    #[must_use]
    pub fn from_datetime(instant: &DateTime<Utc>) -> Self {
        Self(instant.date_naive())
    }

    /// Get the inner calendar date
    #[must_use]
    pub const fn as_date(&self) -> NaiveDate {
        self.0
    }

    /// The previous calendar day
    ///
    /// Returns `None` only at the representable minimum date, which no
    /// realistic photo timestamp reaches.
    #[must_use]
    pub fn pred(&self) -> Option<Self> {
        self.0.checked_sub_days(Days::new(1)).map(Self)
    }

    /// The year component
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| DomainError::InvalidDateKey(format!("{s}: {e}")))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

// ============================================================================
// PhotoId
// ============================================================================

/// Identifier for a photo, local or remote
///
/// Remote photos carry the document store's identifier; locally captured
/// photos are assigned a fresh UUID via [`PhotoId::generate`]. The two ID
/// spaces never collide, and the cache deduplicates by ID only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    /// Create a PhotoId from an existing identifier string
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPhotoId`] if the string is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidPhotoId(id));
        }
        Ok(Self(id))
    }

    /// Generate a fresh random PhotoId for a local capture
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PhotoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// OwnerId
// ============================================================================

/// Identifier for the authenticated owner of a photo collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an OwnerId from an existing identifier string
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidOwnerId`] if the string is empty or
    /// contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidOwnerId(id));
        }
        Ok(Self(id))
    }

    /// Get the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
