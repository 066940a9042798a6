//! Sync gating policy
//!
//! The central "when to talk to the network" decision: given connectivity,
//! the watermark, and the caller's overrides, should a sync attempt
//! proceed right now? The decision is pure and has no side effects, so the
//! throttling rules are testable independently of any fetch machinery.
//!
//! ## Rules
//!
//! 1. No authenticated session is a hard failure, not a skip: the caller
//!    must redirect to sign-in, retrying would not help.
//! 2. Offline always skips.
//! 3. On a metered link, unforced syncs with the WiFi check enabled only
//!    proceed once the freshness threshold has elapsed.
//! 4. Unforced syncs inside the freshness window skip as recently synced.
//! 5. `force_sync` bypasses every timing rule but never the connectivity
//!    ones.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use skinlog_core::domain::SkipReason;
use skinlog_core::ports::Connectivity;

/// Caller-supplied overrides for one sync attempt
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Ignore the freshness threshold (pull-to-refresh)
    pub force_sync: bool,
    /// Apply metered-network throttling when not on WiFi
    pub check_wifi: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force_sync: false,
            check_wifi: true,
        }
    }
}

impl SyncOptions {
    /// Options for a user-initiated refresh: sync now, on any network
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force_sync: true,
            check_wifi: true,
        }
    }
}

/// Everything the decision depends on, captured as plain values
#[derive(Debug, Clone)]
pub struct PolicyContext {
    /// Whether a signed-in session exists
    pub authenticated: bool,
    /// Connectivity class at decision time
    pub connectivity: Connectivity,
    /// The watermark; `None` if never synced
    pub last_sync: Option<DateTime<Utc>>,
    /// Decision instant
    pub now: DateTime<Utc>,
    /// How stale the watermark must be before an unforced sync runs
    pub freshness_threshold: Duration,
}

impl PolicyContext {
    /// True once the freshness threshold has elapsed since the watermark
    ///
    /// Never-synced counts as elapsed.
    fn threshold_elapsed(&self) -> bool {
        match self.last_sync {
            Some(last) => self.now - last >= self.freshness_threshold,
            None => true,
        }
    }
}

/// The gate's verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the sync now
    Proceed,
    /// Do not sync; the reason is informational, not an error
    Skip(SkipReason),
}

/// Hard precondition failures, distinct from skips
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// No signed-in session
    #[error("No authenticated session")]
    NotAuthenticated,
}

/// Decides whether a sync attempt proceeds
pub fn decide(ctx: &PolicyContext, options: &SyncOptions) -> Result<Decision, PolicyError> {
    if !ctx.authenticated {
        return Err(PolicyError::NotAuthenticated);
    }

    if !ctx.connectivity.is_online() {
        return Ok(Decision::Skip(SkipReason::Offline));
    }

    if options.check_wifi && !options.force_sync && !ctx.connectivity.is_wifi() {
        // Metered link: only spend data once the threshold has elapsed.
        if !ctx.threshold_elapsed() {
            return Ok(Decision::Skip(SkipReason::MobileNetwork));
        }
    }

    if !options.force_sync && !ctx.threshold_elapsed() {
        return Ok(Decision::Skip(SkipReason::RecentlySynced));
    }

    Ok(Decision::Proceed)
}

// ============================================================================
// Unit tests
// ============================================================================
