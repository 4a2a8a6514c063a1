//! Valve handle port — async operations against one connected valve.

use std::future::Future;

use valvebridge_domain::error::BridgeError;

/// A live reference to a physical radiator valve.
///
/// Handles are created and owned by the discovery provider and handed to
/// exactly one synchronization engine at a time. A reconnect may hand a
/// replacement handle to the same engine (rebind). The device services one
/// outstanding request per connection; callers sequence their operations.
pub trait ValveHandle: Send + Sync + 'static {
    /// Stable hardware (MAC) address of the valve.
    fn address(&self) -> &str;

    /// Read the device serial number, best-effort.
    ///
    /// Read failures are logged by the implementation and degrade to `None`;
    /// they never abort accessory creation.
    fn serial_number(&self) -> impl Future<Output = Option<String>> + Send;

    /// Establish the device connection.
    fn connect(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Read the measured room temperature, in °C.
    fn current_temperature(&self) -> impl Future<Output = Result<f64, BridgeError>> + Send;

    /// Read the configured target temperature, in °C.
    fn target_temperature(&self) -> impl Future<Output = Result<f64, BridgeError>> + Send;

    /// Write the target temperature, in °C.
    fn set_target_temperature(
        &self,
        value: f64,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
