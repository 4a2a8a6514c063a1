//! Accessory registry port — the framework-persisted accessory cache.

use std::future::Future;

use valvebridge_domain::accessory::AccessoryIdentity;
use valvebridge_domain::error::BridgeError;

/// Framework accessory cache with restore-on-startup semantics.
///
/// The core never persists identities itself; it reads and writes them only
/// through this port.
pub trait AccessoryRegistry: Send {
    /// Persist a freshly created identity (upsert by UUID).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Cache`] when persisting fails. The orchestrator
    /// treats this as non-fatal.
    fn register(
        &self,
        identity: &AccessoryIdentity,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Load every identity persisted by previous runs.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Cache`] when the cache cannot be read.
    fn load_all(&self) -> impl Future<Output = Result<Vec<AccessoryIdentity>, BridgeError>> + Send;
}
