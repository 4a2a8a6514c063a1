//! Discovery & identity orchestrator — owns the set of accessory engines
//! and resolves discovered valves to persistent identities.
//!
//! The orchestrator is driven by two explicit inbound channels: host
//! lifecycle events ([`HostEvent`]) and the discovered-valve channel the
//! provider writes into once scanning starts. Cached accessories are
//! replayed as [`HostEvent::Restored`] before [`HostEvent::Ready`], so a
//! later discovery event for the same address rebinds the existing engine
//! instead of creating a duplicate.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;

use valvebridge_domain::accessory::{AccessoryIdentity, MANUFACTURER};
use valvebridge_domain::id::AccessoryUuid;

use crate::engine::SyncEngine;
use crate::ports::{AccessoryRegistry, UpdatePublisher, ValveDiscovery, ValveHandle};

/// Host lifecycle signals driving the orchestrator.
#[derive(Debug)]
pub enum HostEvent {
    /// A previously cached accessory, replayed once before [`HostEvent::Ready`].
    Restored(AccessoryIdentity),
    /// The host finished launching; discovery may begin.
    Ready,
    /// The host is shutting down.
    Shutdown,
}

/// Capacity of the inbound discovered-valve channel.
const DISCOVERY_CHANNEL_CAPACITY: usize = 16;

/// Owns every accessory engine and the discovery provider.
pub struct Orchestrator<D, R, P>
where
    D: ValveDiscovery,
{
    discovery: D,
    registry: R,
    updates: P,
    poll_interval: Duration,
    engines: HashMap<AccessoryUuid, SyncEngine<D::Handle, P>>,
}

impl<D, R, P> Orchestrator<D, R, P>
where
    D: ValveDiscovery,
    R: AccessoryRegistry,
    P: UpdatePublisher + Clone + Send + Sync + 'static,
{
    /// Create an orchestrator with no known accessories.
    #[must_use]
    pub fn new(discovery: D, registry: R, updates: P, poll_interval: Duration) -> Self {
        Self {
            discovery,
            registry,
            updates,
            poll_interval,
            engines: HashMap::new(),
        }
    }

    /// Number of known accessory identities.
    #[must_use]
    pub fn accessory_count(&self) -> usize {
        self.engines.len()
    }

    /// Look up the engine for an accessory, if known.
    #[must_use]
    pub fn engine(&self, uuid: &AccessoryUuid) -> Option<&SyncEngine<D::Handle, P>> {
        self.engines.get(uuid)
    }

    /// Drive the orchestrator from host lifecycle events until shutdown.
    ///
    /// Returns after [`HostEvent::Shutdown`] (or after the host channel
    /// closes), once discovery teardown and engine shutdown have run.
    pub async fn run(&mut self, mut host_events: mpsc::Receiver<HostEvent>) {
        let (valve_tx, mut valve_rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);

        loop {
            tokio::select! {
                event = host_events.recv() => match event {
                    Some(HostEvent::Restored(identity)) => self.restore(identity),
                    Some(HostEvent::Ready) => {
                        if let Err(err) = self.discovery.start(valve_tx.clone()).await {
                            tracing::error!(%err, "failed to start valve discovery");
                        }
                    }
                    Some(HostEvent::Shutdown) | None => break,
                },
                Some(valve) = valve_rx.recv() => self.handle_discovered(valve).await,
            }
        }

        self.shutdown().await;
    }

    /// Recreate an engine (unbound) for a cache-restored identity.
    fn restore(&mut self, identity: AccessoryIdentity) {
        tracing::info!(address = %identity.address, "loading accessory from cache");
        if self.engines.contains_key(&identity.uuid) {
            tracing::warn!(address = %identity.address, "duplicate cache entry ignored");
            return;
        }
        let uuid = identity.uuid;
        let engine = SyncEngine::new(identity, self.updates.clone(), self.poll_interval);
        self.engines.insert(uuid, engine);
    }

    /// React to one discovered valve: connect, resolve identity, bind.
    async fn handle_discovered(&mut self, valve: D::Handle) {
        let address = valve.address().to_owned();

        if let Err(err) = valve.connect().await {
            tracing::warn!(%err, %address, "failed to connect to valve, dropping discovery event");
            return;
        }

        let uuid = AccessoryUuid::from_address(&address);

        if let Some(engine) = self.engines.get(&uuid) {
            tracing::info!(%address, "restoring accessory");
            engine.bind(valve).await;
            return;
        }

        let serial_number = valve.serial_number().await;
        let identity = match AccessoryIdentity::new(address.clone(), serial_number) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::error!(%err, %address, "discovered valve has an unusable address");
                return;
            }
        };
        tracing::info!(
            %address,
            manufacturer = MANUFACTURER,
            model = identity.model(),
            serial = identity.serial_number_or_unknown(),
            "adding new accessory"
        );

        if let Err(err) = self.registry.register(&identity).await {
            tracing::warn!(%err, %address, "failed to persist accessory identity");
        }

        let engine = SyncEngine::new(identity, self.updates.clone(), self.poll_interval);
        engine.bind(valve).await;
        self.engines.insert(uuid, engine);
    }

    /// Tear down discovery and every engine's poll task.
    async fn shutdown(&mut self) {
        if let Err(err) = self.discovery.disconnect_all().await {
            tracing::warn!(%err, "discovery teardown failed");
        }
        for engine in self.engines.values() {
            engine.shutdown();
        }
        tracing::info!(accessories = self.engines.len(), "bridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use valvebridge_domain::accessory::UNKNOWN_SERIAL;
    use valvebridge_domain::error::BridgeError;

    use crate::engine::DEFAULT_POLL_INTERVAL;
    use crate::update_bus::InProcessUpdateBus;

    fn device_error() -> BridgeError {
        BridgeError::device(std::io::Error::other("out of range"))
    }

    #[derive(Clone)]
    struct FakeValve {
        inner: Arc<FakeValveInner>,
    }

    struct FakeValveInner {
        address: String,
        serial: Option<String>,
        refuse_connect: AtomicBool,
        current: f64,
        target: f64,
    }

    impl FakeValve {
        fn new(address: &str, current: f64, target: f64) -> Self {
            Self {
                inner: Arc::new(FakeValveInner {
                    address: address.to_string(),
                    serial: Some("SN-0042".to_string()),
                    refuse_connect: AtomicBool::new(false),
                    current,
                    target,
                }),
            }
        }

        fn without_serial(address: &str) -> Self {
            Self {
                inner: Arc::new(FakeValveInner {
                    address: address.to_string(),
                    serial: None,
                    refuse_connect: AtomicBool::new(false),
                    current: 20.0,
                    target: 16.0,
                }),
            }
        }

        fn refusing_connections(address: &str) -> Self {
            let valve = Self::new(address, 20.0, 16.0);
            valve.inner.refuse_connect.store(true, Ordering::SeqCst);
            valve
        }
    }

    impl ValveHandle for FakeValve {
        fn address(&self) -> &str {
            &self.inner.address
        }

        async fn serial_number(&self) -> Option<String> {
            self.inner.serial.clone()
        }

        async fn connect(&self) -> Result<(), BridgeError> {
            if self.inner.refuse_connect.load(Ordering::SeqCst) {
                return Err(device_error());
            }
            Ok(())
        }

        async fn current_temperature(&self) -> Result<f64, BridgeError> {
            Ok(self.inner.current)
        }

        async fn target_temperature(&self) -> Result<f64, BridgeError> {
            Ok(self.inner.target)
        }

        async fn set_target_temperature(&self, _value: f64) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDiscovery {
        emit_on_start: Vec<FakeValve>,
        started: Arc<AtomicBool>,
        teardowns: Arc<AtomicUsize>,
    }

    impl ValveDiscovery for FakeDiscovery {
        type Handle = FakeValve;

        async fn start(&mut self, found: mpsc::Sender<FakeValve>) -> Result<(), BridgeError> {
            self.started.store(true, Ordering::SeqCst);
            for valve in self.emit_on_start.drain(..) {
                let _ = found.send(valve).await;
            }
            Ok(())
        }

        async fn disconnect_all(&mut self) -> Result<(), BridgeError> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct InMemoryRegistry {
        entries: Arc<Mutex<Vec<AccessoryIdentity>>>,
        fail_register: Arc<AtomicBool>,
    }

    impl InMemoryRegistry {
        fn entries(&self) -> Vec<AccessoryIdentity> {
            self.entries.lock().unwrap().clone()
        }
    }

    impl AccessoryRegistry for InMemoryRegistry {
        async fn register(&self, identity: &AccessoryIdentity) -> Result<(), BridgeError> {
            if self.fail_register.load(Ordering::SeqCst) {
                return Err(BridgeError::cache(std::io::Error::other("read-only")));
            }
            self.entries.lock().unwrap().push(identity.clone());
            Ok(())
        }

        async fn load_all(&self) -> Result<Vec<AccessoryIdentity>, BridgeError> {
            Ok(self.entries())
        }
    }

    fn orchestrator(
        registry: InMemoryRegistry,
    ) -> Orchestrator<FakeDiscovery, InMemoryRegistry, InProcessUpdateBus> {
        Orchestrator::new(
            FakeDiscovery::default(),
            registry,
            InProcessUpdateBus::new(64),
            DEFAULT_POLL_INTERVAL,
        )
    }

    #[tokio::test]
    async fn should_create_identity_and_engine_for_new_valve() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry.clone());

        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0))
            .await;

        assert_eq!(orch.accessory_count(), 1);
        let entries = registry.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(entries[0].serial_number.as_deref(), Some("SN-0042"));

        let uuid = AccessoryUuid::from_address("AA:BB:CC:DD:EE:FF");
        let engine = orch.engine(&uuid).unwrap();
        assert!(engine.is_bound());
        assert_eq!(engine.current_temperature(), 21.0);
        assert_eq!(engine.target_temperature(), 17.0);
        engine.shutdown();
    }

    #[tokio::test]
    async fn should_rebind_restored_identity_without_duplicating() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry.clone());

        let identity = AccessoryIdentity::new("AA:BB:CC:DD:EE:FF", None).unwrap();
        let uuid = identity.uuid;
        orch.restore(identity);
        assert_eq!(orch.accessory_count(), 1);
        assert!(!orch.engine(&uuid).unwrap().is_bound());

        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0))
            .await;

        assert_eq!(orch.accessory_count(), 1);
        let engine = orch.engine(&uuid).unwrap();
        assert!(engine.is_bound());
        assert_eq!(engine.current_temperature(), 21.0);
        // Rebinding an already known identity never re-registers it.
        assert!(registry.entries().is_empty());
        engine.shutdown();
    }

    #[tokio::test]
    async fn should_ignore_duplicate_cache_entries() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry);

        let identity = AccessoryIdentity::new("AA:BB:CC:DD:EE:FF", None).unwrap();
        orch.restore(identity.clone());
        orch.restore(identity);
        assert_eq!(orch.accessory_count(), 1);
    }

    #[tokio::test]
    async fn should_drop_event_when_connect_fails() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry.clone());

        orch.handle_discovered(FakeValve::refusing_connections("AA:BB:CC:DD:EE:FF"))
            .await;
        assert_eq!(orch.accessory_count(), 0);
        assert!(registry.entries().is_empty());

        // The same address may reappear and succeed later.
        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0))
            .await;
        assert_eq!(orch.accessory_count(), 1);
        let uuid = AccessoryUuid::from_address("AA:BB:CC:DD:EE:FF");
        orch.engine(&uuid).unwrap().shutdown();
    }

    #[tokio::test]
    async fn should_tolerate_missing_serial_number() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry.clone());

        orch.handle_discovered(FakeValve::without_serial("AA:BB:CC:DD:EE:FF"))
            .await;

        let entries = registry.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].serial_number, None);
        assert_eq!(entries[0].serial_number_or_unknown(), UNKNOWN_SERIAL);

        let uuid = AccessoryUuid::from_address("AA:BB:CC:DD:EE:FF");
        orch.engine(&uuid).unwrap().shutdown();
    }

    #[tokio::test]
    async fn should_keep_engine_when_registration_fails() {
        let registry = InMemoryRegistry::default();
        registry.fail_register.store(true, Ordering::SeqCst);
        let mut orch = orchestrator(registry.clone());

        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0))
            .await;

        assert_eq!(orch.accessory_count(), 1);
        assert!(registry.entries().is_empty());
        let uuid = AccessoryUuid::from_address("AA:BB:CC:DD:EE:FF");
        orch.engine(&uuid).unwrap().shutdown();
    }

    #[tokio::test]
    async fn should_track_one_engine_per_address() {
        let registry = InMemoryRegistry::default();
        let mut orch = orchestrator(registry);

        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0))
            .await;
        orch.handle_discovered(FakeValve::new("CC:22:37:11:22:33", 19.0, 15.0))
            .await;
        orch.handle_discovered(FakeValve::new("AA:BB:CC:DD:EE:FF", 22.0, 17.0))
            .await;

        assert_eq!(orch.accessory_count(), 2);
        for engine in orch.engines.values() {
            engine.shutdown();
        }
    }

    #[tokio::test]
    async fn should_run_lifecycle_until_shutdown() {
        let registry = InMemoryRegistry::default();
        let discovery = FakeDiscovery {
            emit_on_start: vec![FakeValve::new("AA:BB:CC:DD:EE:FF", 21.0, 17.0)],
            ..FakeDiscovery::default()
        };
        let started = Arc::clone(&discovery.started);
        let teardowns = Arc::clone(&discovery.teardowns);

        let mut orch = Orchestrator::new(
            discovery,
            registry,
            InProcessUpdateBus::new(64),
            DEFAULT_POLL_INTERVAL,
        );

        let (host_tx, host_rx) = mpsc::channel(8);
        let restored = AccessoryIdentity::new("CC:22:37:11:22:33", None).unwrap();

        let driver = async {
            host_tx
                .send(HostEvent::Restored(restored.clone()))
                .await
                .unwrap();
            host_tx.send(HostEvent::Ready).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            host_tx.send(HostEvent::Shutdown).await.unwrap();
        };

        let ((), ()) = tokio::join!(orch.run(host_rx), driver);

        assert!(started.load(Ordering::SeqCst));
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
        assert_eq!(orch.accessory_count(), 2);

        let discovered = AccessoryUuid::from_address("AA:BB:CC:DD:EE:FF");
        assert!(orch.engine(&discovered).unwrap().is_bound());
        assert!(!orch.engine(&restored.uuid).unwrap().is_bound());
    }
}
