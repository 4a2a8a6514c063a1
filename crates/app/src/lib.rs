//! # valvebridge-app
//!
//! Application layer — port definitions (traits) and the accessory
//! lifecycle core.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement (driven/outbound ports):
//!   - [`ports::ValveHandle`] — async operations against one connected valve
//!   - [`ports::ValveDiscovery`] — scanning + channel-based device emission
//!   - [`ports::AccessoryRegistry`] — persisted accessory cache
//!   - [`ports::UpdatePublisher`] — characteristic update push
//! - [`orchestrator::Orchestrator`] — react to host lifecycle and discovery
//!   events, resolve accessory identities, own the engine set
//! - [`engine::SyncEngine`] — per-accessory telemetry polling, write
//!   serialization, and capability handlers
//! - Provide **in-process infrastructure** (characteristic update bus) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `valvebridge-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod engine;
pub mod orchestrator;
pub mod ports;
pub mod update_bus;
