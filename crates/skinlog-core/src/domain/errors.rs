//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including identifier validation and date-key parsing failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Date key is not a valid `YYYY-MM-DD` calendar day
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),

    /// Photo identifier is empty or malformed
    #[error("Invalid photo ID: {0}")]
    InvalidPhotoId(String),

    /// Owner identifier is empty or malformed
    #[error("Invalid owner ID: {0}")]
    InvalidOwnerId(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
