//! BLE adapter error types.

use std::time::Duration;

use valvebridge_domain::error::BridgeError;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// BLE transport operation failed.
    #[error("BLE transport error")]
    Ble(#[from] btleplug::Error),

    /// A connect or register operation exceeded the configured timeout.
    #[error("BLE operation timed out after {0:?}")]
    Timeout(Duration),

    /// The peripheral does not expose an expected characteristic.
    #[error("characteristic {uuid} missing on peripheral")]
    CharacteristicMissing {
        /// The characteristic that was looked up.
        uuid: uuid::Uuid,
    },

    /// A register payload could not be decoded.
    #[error("register decode error")]
    Protocol(#[source] ProtocolError),
}

/// Details about why a register payload could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Temperature registers are exactly two bytes.
    #[error("temperature register must be 2 bytes, got {actual}")]
    TemperatureLength {
        /// The actual length received.
        actual: usize,
    },

    /// The serial register must hold UTF-8 text.
    #[error("serial register is not valid UTF-8")]
    SerialEncoding,
}

impl BleError {
    /// Convert into a [`BridgeError::Device`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        BridgeError::device(self)
    }
}

impl From<BleError> for BridgeError {
    fn from(err: BleError) -> Self {
        err.into_domain()
    }
}
