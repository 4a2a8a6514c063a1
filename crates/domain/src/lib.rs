//! # valvebridge-domain
//!
//! Pure domain model for the valvebridge radiator-valve bridge.
//!
//! ## Responsibilities
//! - Foundational types: the deterministic accessory identifier and the
//!   persisted accessory identity record
//! - Thermostat characteristic value types and the exposed temperature floor
//! - Error conventions: capability status errors, validation errors, and the
//!   workspace-level [`error::BridgeError`]
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod accessory;
pub mod error;
pub mod id;
pub mod thermostat;
