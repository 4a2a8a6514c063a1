//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the lifecycle core and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod discovery;
pub mod registry;
pub mod updates;
pub mod valve;

pub use discovery::ValveDiscovery;
pub use registry::AccessoryRegistry;
pub use updates::UpdatePublisher;
pub use valve::ValveHandle;
