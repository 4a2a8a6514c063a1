//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `valvebridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use valvebridge_adapter_ble::BleConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accessory cache settings.
    pub cache: CacheConfig,
    /// Telemetry poll settings.
    pub poll: PollConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// BLE discovery settings.
    pub ble: BleConfig,
}

/// Accessory cache location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path of the JSON accessory cache file.
    pub path: String,
}

/// Telemetry poll cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between telemetry refreshes on a bound valve.
    pub interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `valvebridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// semantic check fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("valvebridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VALVEBRIDGE_CACHE_PATH") {
            self.cache.path = val;
        }
        if let Ok(val) = std::env::var("VALVEBRIDGE_POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.poll.interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("VALVEBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.cache.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`](std::time::Duration).
    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll.interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: "valvebridge-accessories.json".to_string(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "valvebridged=info,valvebridge=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
