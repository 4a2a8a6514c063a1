//! End-to-end test of the accessory lifecycle over a real cache file:
//! discover → persist → restart → restore → rebind.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use valvebridge_adapter_cache_json::JsonAccessoryCache;
use valvebridge_app::orchestrator::{HostEvent, Orchestrator};
use valvebridge_app::ports::{AccessoryRegistry, ValveDiscovery, ValveHandle};
use valvebridge_app::update_bus::InProcessUpdateBus;
use valvebridge_domain::error::BridgeError;
use valvebridge_domain::id::AccessoryUuid;

const VALVE_ADDRESS: &str = "CC:22:37:11:22:33";

struct TempPath(PathBuf);

impl TempPath {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "valvebridged-test-{}-{name}.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        Self(path)
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

#[derive(Clone)]
struct StubValve;

impl ValveHandle for StubValve {
    fn address(&self) -> &str {
        VALVE_ADDRESS
    }

    async fn serial_number(&self) -> Option<String> {
        Some("SN-0042".to_string())
    }

    async fn connect(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn current_temperature(&self) -> Result<f64, BridgeError> {
        Ok(21.0)
    }

    async fn target_temperature(&self) -> Result<f64, BridgeError> {
        Ok(17.0)
    }

    async fn set_target_temperature(&self, _value: f64) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// Emits one stub valve when scanning starts.
struct ScriptedDiscovery {
    torn_down: Arc<AtomicBool>,
}

impl ValveDiscovery for ScriptedDiscovery {
    type Handle = StubValve;

    async fn start(&mut self, found: mpsc::Sender<StubValve>) -> Result<(), BridgeError> {
        let _ = found.send(StubValve).await;
        Ok(())
    }

    async fn disconnect_all(&mut self) -> Result<(), BridgeError> {
        self.torn_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

async fn run_session(
    cache: JsonAccessoryCache,
    restored: Vec<valvebridge_domain::accessory::AccessoryIdentity>,
) -> (
    Orchestrator<ScriptedDiscovery, JsonAccessoryCache, InProcessUpdateBus>,
    Arc<AtomicBool>,
) {
    let torn_down = Arc::new(AtomicBool::new(false));
    let discovery = ScriptedDiscovery {
        torn_down: Arc::clone(&torn_down),
    };

    let mut orchestrator = Orchestrator::new(
        discovery,
        cache,
        InProcessUpdateBus::new(64),
        Duration::from_secs(10),
    );

    let (host_tx, host_rx) = mpsc::channel(restored.len() + 2);
    let driver = async {
        for identity in restored {
            host_tx.send(HostEvent::Restored(identity)).await.unwrap();
        }
        host_tx.send(HostEvent::Ready).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        host_tx.send(HostEvent::Shutdown).await.unwrap();
    };

    let ((), ()) = tokio::join!(orchestrator.run(host_rx), driver);
    (orchestrator, torn_down)
}

#[tokio::test]
async fn should_persist_discovered_accessory_and_rebind_after_restart() {
    let path = TempPath::new("lifecycle");
    let uuid = AccessoryUuid::from_address(VALVE_ADDRESS);

    // First run: the valve is brand new, so discovery creates and
    // persists its identity.
    {
        let cache = JsonAccessoryCache::open(&path.0).unwrap();
        let (orchestrator, torn_down) = run_session(cache, Vec::new()).await;

        assert_eq!(orchestrator.accessory_count(), 1);
        let engine = orchestrator.engine(&uuid).unwrap();
        assert!(engine.is_bound());
        assert_eq!(engine.current_temperature(), 21.0);
        assert_eq!(engine.target_temperature(), 17.0);
        assert!(torn_down.load(Ordering::SeqCst));
    }

    // Second run: the identity comes back from the cache file and the
    // rediscovered valve rebinds it instead of duplicating it.
    {
        let cache = JsonAccessoryCache::open(&path.0).unwrap();
        let restored = cache.load_all().await.unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].address, VALVE_ADDRESS);
        assert_eq!(restored[0].serial_number.as_deref(), Some("SN-0042"));

        let (orchestrator, torn_down) = run_session(cache, restored).await;

        assert_eq!(orchestrator.accessory_count(), 1);
        assert!(orchestrator.engine(&uuid).unwrap().is_bound());
        assert!(torn_down.load(Ordering::SeqCst));
    }
}
