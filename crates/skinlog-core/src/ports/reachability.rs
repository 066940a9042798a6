//! Network reachability port (driven/secondary port)
//!
//! Reports the connectivity class the sync policy gates on. Platform glue
//! (mobile OS callbacks, netlink, a periodic probe) feeds an implementation;
//! the core only ever asks "what class of network do we have right now?".

use serde::{Deserialize, Serialize};

/// Connectivity class as seen by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// No usable network
    Offline,
    /// WiFi (or equivalent unmetered link)
    Wifi,
    /// Cellular or other metered link
    Cellular,
}

impl Connectivity {
    /// True for any usable network
    pub fn is_online(&self) -> bool {
        !matches!(self, Connectivity::Offline)
    }

    /// True only on an unmetered link
    pub fn is_wifi(&self) -> bool {
        matches!(self, Connectivity::Wifi)
    }
}

/// Port trait for probing current connectivity
///
/// ## Implementation Notes
///
/// Implementations that cannot determine the link type should report
/// [`Connectivity::Cellular`] when connected: the policy then applies its
/// conservative metered-network throttling rather than burning data.
#[async_trait::async_trait]
pub trait IReachabilityProbe: Send + Sync {
    /// The connectivity class at this moment
    async fn current(&self) -> Connectivity;
}
