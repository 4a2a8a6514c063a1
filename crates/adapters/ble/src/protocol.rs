//! Valve register codec.
//!
//! Pure functions operating on raw `&[u8]` slices — no BLE dependency
//! needed. Temperatures travel as little-endian `i16` values in tenths of a
//! degree Celsius; the serial register holds NUL-padded UTF-8 text.

use crate::error::ProtocolError;

/// Decode a temperature register payload into °C.
///
/// # Errors
///
/// Returns [`ProtocolError::TemperatureLength`] when the payload is not
/// exactly two bytes.
pub fn decode_temperature(payload: &[u8]) -> Result<f64, ProtocolError> {
    let bytes: [u8; 2] = payload
        .try_into()
        .map_err(|_| ProtocolError::TemperatureLength {
            actual: payload.len(),
        })?;
    Ok(f64::from(i16::from_le_bytes(bytes)) / 10.0)
}

/// Encode a °C value into a temperature register payload.
///
/// The value is rounded to the nearest tenth of a degree and saturated to
/// the register range.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_temperature(value: f64) -> [u8; 2] {
    let deci = (value * 10.0)
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
    deci.to_le_bytes()
}

/// Decode the serial-number register.
///
/// # Errors
///
/// Returns [`ProtocolError::SerialEncoding`] when the payload is not valid
/// UTF-8.
pub fn decode_serial(payload: &[u8]) -> Result<String, ProtocolError> {
    let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::SerialEncoding)?;
    Ok(text.trim_end_matches('\0').trim().to_string())
}
