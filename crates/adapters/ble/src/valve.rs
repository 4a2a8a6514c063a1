//! Radiator valve handle — GATT register access over btleplug.

use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use uuid::Uuid;

use valvebridge_app::ports::ValveHandle;
use valvebridge_domain::error::BridgeError;

use crate::error::BleError;
use crate::protocol;

/// Vendor GATT service advertised by the valves.
pub const VALVE_SERVICE: Uuid = Uuid::from_u128(0x8c85_0001_1d9e_4b7a_9a57_2f8b_c5d4_1e03);

/// Measured room temperature register (read).
const CURRENT_TEMPERATURE_CHAR: Uuid = Uuid::from_u128(0x8c85_0002_1d9e_4b7a_9a57_2f8b_c5d4_1e03);

/// Target temperature register (read/write).
const TARGET_TEMPERATURE_CHAR: Uuid = Uuid::from_u128(0x8c85_0003_1d9e_4b7a_9a57_2f8b_c5d4_1e03);

/// Serial number register (read).
const SERIAL_NUMBER_CHAR: Uuid = Uuid::from_u128(0x8c85_0004_1d9e_4b7a_9a57_2f8b_c5d4_1e03);

/// A discovered radiator valve peripheral.
///
/// The valve services one request at a time; the synchronization engine
/// sequences reads within a poll cycle and serializes writes through its
/// write guard. Every operation carries the configured per-operation
/// timeout.
#[derive(Debug, Clone)]
pub struct RadiatorValve {
    peripheral: Peripheral,
    address: String,
    io_timeout: Duration,
}

impl RadiatorValve {
    /// Wrap a peripheral advertising the valve service.
    #[must_use]
    pub fn new(peripheral: Peripheral, address: String, io_timeout: Duration) -> Self {
        Self {
            peripheral,
            address,
            io_timeout,
        }
    }

    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic, BleError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(BleError::CharacteristicMissing { uuid })
    }

    async fn read_register(&self, uuid: Uuid) -> Result<Vec<u8>, BleError> {
        let characteristic = self.characteristic(uuid)?;
        tokio::time::timeout(self.io_timeout, self.peripheral.read(&characteristic))
            .await
            .map_err(|_| BleError::Timeout(self.io_timeout))?
            .map_err(BleError::Ble)
    }

    async fn read_temperature(&self, uuid: Uuid) -> Result<f64, BridgeError> {
        let payload = self.read_register(uuid).await?;
        protocol::decode_temperature(&payload)
            .map_err(|err| BleError::Protocol(err).into_domain())
    }
}

impl ValveHandle for RadiatorValve {
    fn address(&self) -> &str {
        &self.address
    }

    async fn serial_number(&self) -> Option<String> {
        let payload = match self.read_register(SERIAL_NUMBER_CHAR).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%err, address = %self.address, "failed to read serial number");
                return None;
            }
        };
        match protocol::decode_serial(&payload) {
            Ok(serial) => Some(serial),
            Err(err) => {
                tracing::warn!(%err, address = %self.address, "unreadable serial register");
                None
            }
        }
    }

    async fn connect(&self) -> Result<(), BridgeError> {
        let connect = async {
            self.peripheral.connect().await?;
            self.peripheral.discover_services().await?;
            Ok::<(), btleplug::Error>(())
        };
        tokio::time::timeout(self.io_timeout, connect)
            .await
            .map_err(|_| BleError::Timeout(self.io_timeout).into_domain())?
            .map_err(|err| BleError::Ble(err).into_domain())?;
        tracing::debug!(address = %self.address, "valve connected");
        Ok(())
    }

    async fn current_temperature(&self) -> Result<f64, BridgeError> {
        self.read_temperature(CURRENT_TEMPERATURE_CHAR).await
    }

    async fn target_temperature(&self) -> Result<f64, BridgeError> {
        self.read_temperature(TARGET_TEMPERATURE_CHAR).await
    }

    async fn set_target_temperature(&self, value: f64) -> Result<(), BridgeError> {
        let characteristic = self
            .characteristic(TARGET_TEMPERATURE_CHAR)
            .map_err(BleError::into_domain)?;
        let payload = protocol::encode_temperature(value);
        tokio::time::timeout(
            self.io_timeout,
            self.peripheral
                .write(&characteristic, &payload, WriteType::WithResponse),
        )
        .await
        .map_err(|_| BleError::Timeout(self.io_timeout).into_domain())?
        .map_err(|err| BleError::Ble(err).into_domain())
    }
}
