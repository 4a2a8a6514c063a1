//! Discovery provider port — scanning plus channel-based valve emission.

use std::future::Future;

use tokio::sync::mpsc;

use valvebridge_domain::error::BridgeError;

use super::valve::ValveHandle;

/// Emits discovered-valve handles into an inbound channel.
///
/// The provider may emit the same hardware address more than once over the
/// process lifetime (reconnects); emission order is not guaranteed. Handles
/// arrive unconnected — the orchestrator performs the connection attempt.
pub trait ValveDiscovery: Send {
    /// The handle type emitted by this provider.
    type Handle: ValveHandle;

    /// Begin scanning, emitting each discovered valve into `found`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the radio is unavailable or the
    /// scan cannot be started.
    fn start(
        &mut self,
        found: mpsc::Sender<Self::Handle>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Stop scanning and disconnect every known peripheral.
    ///
    /// Idempotent: safe to call when scanning never started or teardown
    /// already ran, and never blocks on already-torn-down state.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Device`] when the radio rejects the teardown.
    fn disconnect_all(&mut self) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
