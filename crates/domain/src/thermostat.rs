//! Thermostat characteristic values exposed for each accessory.

use serde::{Deserialize, Serialize};

/// Lowest temperature ever exposed to the framework, in °C.
///
/// Raw device readings below this (including the zero an engine holds before
/// its first successful poll) are clamped up before leaving the engine.
pub const TEMPERATURE_FLOOR: f64 = 10.0;

/// Clamp a raw temperature reading to [`TEMPERATURE_FLOOR`].
#[must_use]
pub fn floor_clamped(value: f64) -> f64 {
    value.max(TEMPERATURE_FLOOR)
}

/// Target heating/cooling mode characteristic.
///
/// The valves run a single automatic program: `Auto` is reported whenever a
/// device is bound, `Off` otherwise, and user writes are always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetHeatingCoolingMode {
    Off,
    Heat,
    Cool,
    Auto,
}

/// Current heating/cooling mode characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentHeatingCoolingMode {
    Off,
    Heat,
}

/// Temperature display units characteristic. The valves are Celsius-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureDisplayUnits {
    Celsius,
    Fahrenheit,
}

/// A characteristic value pushed from an engine toward the framework
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "characteristic", content = "value", rename_all = "snake_case")]
pub enum CharacteristicUpdate {
    CurrentTemperature(f64),
    TargetTemperature(f64),
    CurrentHeatingCoolingMode(CurrentHeatingCoolingMode),
}
