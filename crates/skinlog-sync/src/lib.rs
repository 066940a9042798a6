//! Skinlog Sync - Photo synchronization engine
//!
//! Provides:
//! - Policy-gated incremental sync against the remote photo repository
//! - Backward pagination for infinite-scroll history
//! - First-run bootstrap seeding
//! - Single-flight coalescing of concurrent sync triggers
//!
//! ## Modules
//!
//! - [`policy`] - Pure gating decision (connectivity, freshness, overrides)
//! - [`manager`] - The [`SyncManager`] orchestrating fetches into the cache
//! - [`reachability`] - Watch-channel adapter behind the reachability port
//!
//! Every public operation returns a discriminated outcome rather than a
//! `Result`: skips, timeouts, and fetch failures are values the caller
//! renders, not errors that propagate.

pub mod manager;
pub mod policy;
pub mod reachability;

pub use manager::{LoadMoreOutcome, SyncManager, SyncOutcome};
pub use policy::{Decision, PolicyContext, PolicyError, SyncOptions};
pub use reachability::WatchReachability;
