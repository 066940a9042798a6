//! Auth session port (driven/secondary port)
//!
//! The sync engine only needs to know *who* is signed in, if anyone.
//! Sign-in/sign-up flows, token refresh, and credential storage are the
//! auth provider's concern and live entirely outside this core.

use crate::domain::newtypes::OwnerId;

/// Port trait exposing the current authenticated session
///
/// Implementations are expected to answer from already-held session state;
/// this is a synchronous read, not a network round trip.
pub trait IAuthSession: Send + Sync {
    /// The currently signed-in owner, or `None` when signed out
    fn current_user(&self) -> Option<OwnerId>;
}
