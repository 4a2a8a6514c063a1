//! In-process characteristic update bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use valvebridge_domain::error::BridgeError;
use valvebridge_domain::id::AccessoryUuid;
use valvebridge_domain::thermostat::CharacteristicUpdate;

use crate::ports::UpdatePublisher;

/// One characteristic update tagged with the accessory it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessoryUpdate {
    pub accessory: AccessoryUuid,
    pub update: CharacteristicUpdate,
}

/// In-process update bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the update is simply dropped).
#[derive(Debug, Clone)]
pub struct InProcessUpdateBus {
    sender: broadcast::Sender<AccessoryUpdate>,
}

impl InProcessUpdateBus {
    /// Create a new update bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to updates on this bus.
    ///
    /// Returns a receiver that will get all updates published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryUpdate> {
        self.sender.subscribe()
    }
}

impl UpdatePublisher for InProcessUpdateBus {
    fn publish(
        &self,
        accessory: AccessoryUuid,
        update: CharacteristicUpdate,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        // broadcast::send fails only when there are zero receivers,
        // which is fine — we simply ignore the error.
        let _ = self.sender.send(AccessoryUpdate { accessory, update });
        async { Ok(()) }
    }
}
