//! BLE adapter configuration.

use serde::Deserialize;

/// Configuration for valve discovery and connections.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// Advertised local-name prefix identifying a radiator valve.
    pub name_prefix: String,
    /// Per-operation timeout for connects and register reads/writes, in
    /// seconds.
    pub io_timeout_secs: u16,
    /// Optional MAC address allowlist (e.g. `["CC:22:37:11:22:33"]`).
    ///
    /// When empty, every advertised valve is accepted.
    pub device_filter: Vec<String>,
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            name_prefix: "Vestra".to_string(),
            io_timeout_secs: 10,
            device_filter: Vec::new(),
        }
    }
}
