//! Watch-channel reachability adapter
//!
//! Platform glue (mobile OS connectivity callbacks, netlink listeners, a
//! periodic probe) pushes connectivity changes into a watch channel; the
//! sync policy reads the latest value through the `IReachabilityProbe`
//! port. The probe never blocks on the platform.

use tokio::sync::watch;
use tracing::info;

use skinlog_core::ports::{Connectivity, IReachabilityProbe};

/// Reachability probe fed by a watch channel
pub struct WatchReachability {
    rx: watch::Receiver<Connectivity>,
}

impl WatchReachability {
    /// Creates a probe with the given initial state
    ///
    /// Returns the sender half for platform glue to push updates into,
    /// and the probe to hand to the sync manager.
    pub fn new(initial: Connectivity) -> (watch::Sender<Connectivity>, Self) {
        info!(connectivity = ?initial, "Creating reachability feed");
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }
}

#[async_trait::async_trait]
impl IReachabilityProbe for WatchReachability {
    async fn current(&self) -> Connectivity {
        *self.rx.borrow()
    }
}
