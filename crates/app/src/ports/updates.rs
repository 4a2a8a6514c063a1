//! Characteristic update port — the push side of the framework boundary.

use std::future::Future;

use valvebridge_domain::error::BridgeError;
use valvebridge_domain::id::AccessoryUuid;
use valvebridge_domain::thermostat::CharacteristicUpdate;

/// Pushes characteristic updates for an accessory toward the framework.
pub trait UpdatePublisher: Send + Sync {
    /// Publish one characteristic update for the given accessory.
    ///
    /// Losing an update because nobody is listening is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] only when the publisher itself fails; engines
    /// log such failures and carry on.
    fn publish(
        &self,
        accessory: AccessoryUuid,
        update: CharacteristicUpdate,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
