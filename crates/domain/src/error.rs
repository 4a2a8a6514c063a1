//! Common error types used across the workspace.

use std::error::Error;

/// Capability-level status raised from characteristic handlers.
///
/// Closed set: the embedding framework adapter translates these into its own
/// status codes at the boundary; nothing else ever crosses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    /// The accessory cannot service the request — no valve is bound, the
    /// device write failed, or the operation is not supported at all.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// A target-temperature write is already in flight.
    #[error("resource busy")]
    ResourceBusy,
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Accessory identities require a non-empty hardware address.
    #[error("accessory address must not be empty")]
    EmptyAddress,
}

/// Workspace-level error carried across port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant failed.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Device I/O failed (connect, register read or write).
    #[error("device error")]
    Device(#[source] Box<dyn Error + Send + Sync>),

    /// The accessory cache failed to load or persist.
    #[error("accessory cache error")]
    Cache(#[source] Box<dyn Error + Send + Sync>),
}

impl BridgeError {
    /// Wrap an adapter error as a device I/O failure.
    pub fn device(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Device(Box::new(err))
    }

    /// Wrap an adapter error as an accessory cache failure.
    pub fn cache(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Cache(Box::new(err))
    }
}
