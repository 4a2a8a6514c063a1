//! Deterministic accessory identifier derived from a hardware address.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// UUID v5 namespace for accessory identifiers.
///
/// Fixed forever: changing it would orphan every cached accessory.
const ACCESSORY_NAMESPACE: uuid::Uuid =
    uuid::Uuid::from_u128(0x8c85_0000_4f1e_42d3_9b1c_a0e6_55d1_73ce);

/// Unique identifier for an accessory, derived deterministically from the
/// device hardware address.
///
/// The same address always yields the same UUID, across repeated calls and
/// across process restarts, which is what lets a freshly discovered valve
/// resolve to an identity persisted by a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessoryUuid(uuid::Uuid);

impl AccessoryUuid {
    /// Derive the identifier for the given hardware address.
    #[must_use]
    pub fn from_address(address: &str) -> Self {
        Self(uuid::Uuid::new_v5(&ACCESSORY_NAMESPACE, address.as_bytes()))
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for AccessoryUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AccessoryUuid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}
