//! Accessory identity — the persisted record tying a hardware address to a
//! framework-visible accessory.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::AccessoryUuid;

/// Manufacturer reported in accessory information metadata.
pub const MANUFACTURER: &str = "Vestra";

/// Placeholder serial number when the device never reported one.
pub const UNKNOWN_SERIAL: &str = "Unknown";

/// Identifies a controllable valve across process restarts.
///
/// The `uuid` is derived from `address`, so rediscovering the same physical
/// device always resolves to the same identity — including identities
/// restored from the accessory cache of a previous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryIdentity {
    /// Stable hardware (MAC) address of the valve.
    pub address: String,
    /// Deterministic identifier derived from `address`.
    pub uuid: AccessoryUuid,
    /// Device serial number, read best-effort during discovery.
    pub serial_number: Option<String>,
}

impl AccessoryIdentity {
    /// Build an identity for the given address, deriving the UUID.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyAddress`] when `address` is empty or
    /// whitespace-only.
    pub fn new(
        address: impl Into<String>,
        serial_number: Option<String>,
    ) -> Result<Self, ValidationError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        let uuid = AccessoryUuid::from_address(&address);
        Ok(Self {
            address,
            uuid,
            serial_number,
        })
    }

    /// Serial number for display and accessory metadata, degrading to
    /// [`UNKNOWN_SERIAL`] when none was read.
    #[must_use]
    pub fn serial_number_or_unknown(&self) -> &str {
        self.serial_number.as_deref().unwrap_or(UNKNOWN_SERIAL)
    }

    /// Model string for accessory metadata. The valves expose no model
    /// register, so the hardware address stands in.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.address
    }
}
