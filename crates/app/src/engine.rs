//! Accessory synchronization engine — keeps one accessory's thermostat
//! characteristics consistent with its valve.
//!
//! One engine exists per accessory identity. It owns the bound valve handle
//! (if any), the periodic telemetry poll task, and the single-permit write
//! guard that serializes target-temperature writes. Engines are created
//! unbound when an accessory is restored from cache, or already bound when
//! discovery reports a brand-new device; they live for the process lifetime
//! and are torn down only by [`SyncEngine::shutdown`] at host shutdown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use valvebridge_domain::accessory::AccessoryIdentity;
use valvebridge_domain::error::StatusError;
use valvebridge_domain::thermostat::{
    CharacteristicUpdate, CurrentHeatingCoolingMode, TargetHeatingCoolingMode,
    TemperatureDisplayUnits, floor_clamped,
};

use crate::ports::{UpdatePublisher, ValveHandle};

/// How often a bound engine refreshes telemetry from its valve.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Per-accessory synchronization engine.
pub struct SyncEngine<V, P> {
    identity: AccessoryIdentity,
    updates: P,
    poll_interval: Duration,
    shared: Arc<Shared<V>>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<V> {
    state: Mutex<SyncState<V>>,
    /// Single-permit write guard. Try-acquire only: a second writer is
    /// rejected, never queued.
    write_permit: Semaphore,
}

struct SyncState<V> {
    current_temperature: f64,
    target_temperature: f64,
    valve: Option<Arc<V>>,
}

impl<V> Shared<V> {
    fn state(&self) -> MutexGuard<'_, SyncState<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_in_flight(&self) -> bool {
        self.write_permit.available_permits() == 0
    }
}

impl<V, P> SyncEngine<V, P>
where
    V: ValveHandle,
    P: UpdatePublisher + Clone + Send + Sync + 'static,
{
    /// Create an engine with no bound valve (cache-restored accessory).
    #[must_use]
    pub fn new(identity: AccessoryIdentity, updates: P, poll_interval: Duration) -> Self {
        Self {
            identity,
            updates,
            poll_interval,
            shared: Arc::new(Shared {
                state: Mutex::new(SyncState {
                    current_temperature: 0.0,
                    target_temperature: 0.0,
                    valve: None,
                }),
                write_permit: Semaphore::new(1),
            }),
            poll_task: Mutex::new(None),
        }
    }

    /// The identity this engine synchronizes.
    #[must_use]
    pub fn identity(&self) -> &AccessoryIdentity {
        &self.identity
    }

    /// Whether a live valve is currently bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.shared.state().valve.is_some()
    }

    /// Bind a valve handle, replacing any previous one, and (re)start
    /// polling.
    ///
    /// The current heating/cooling mode is reported as heating right away: a
    /// valve that just accepted a connection is assumed controllable. The
    /// first telemetry refresh runs inline before the periodic task is
    /// spawned; any previous poll task is aborted first, so there is never
    /// more than one timer per engine.
    pub async fn bind(&self, valve: V) {
        self.shared.state().valve = Some(Arc::new(valve));

        tracing::info!(address = %self.identity.address, "valve bound");

        publish(
            &self.updates,
            &self.identity,
            CharacteristicUpdate::CurrentHeatingCoolingMode(CurrentHeatingCoolingMode::Heat),
        )
        .await;

        poll_cycle(&self.shared, &self.updates, &self.identity).await;

        let mut task = self.lock_poll_task();
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            self.updates.clone(),
            self.identity.clone(),
            self.poll_interval,
        )));
    }

    /// Current temperature characteristic, clamped to the exposed floor.
    #[must_use]
    pub fn current_temperature(&self) -> f64 {
        floor_clamped(self.shared.state().current_temperature)
    }

    /// Target temperature characteristic, clamped to the exposed floor.
    #[must_use]
    pub fn target_temperature(&self) -> f64 {
        floor_clamped(self.shared.state().target_temperature)
    }

    /// Write a new target temperature to the valve.
    ///
    /// # Errors
    ///
    /// Returns [`StatusError::ServiceUnavailable`] when no valve is bound or
    /// the device write fails, and [`StatusError::ResourceBusy`] when another
    /// write is still in flight. Local state is unchanged on every failure
    /// path.
    pub async fn set_target_temperature(&self, value: f64) -> Result<(), StatusError> {
        let valve = self
            .shared
            .state()
            .valve
            .clone()
            .ok_or(StatusError::ServiceUnavailable)?;

        // Released on drop, on success and failure alike.
        let _permit = self
            .shared
            .write_permit
            .try_acquire()
            .map_err(|_| StatusError::ResourceBusy)?;

        match valve.set_target_temperature(value).await {
            Ok(()) => {
                self.shared.state().target_temperature = value;
                tracing::debug!(address = %self.identity.address, value, "target temperature set");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    %err,
                    address = %self.identity.address,
                    value,
                    "failed to set target temperature"
                );
                Err(StatusError::ServiceUnavailable)
            }
        }
    }

    /// Target mode characteristic: automatic whenever a valve is bound.
    #[must_use]
    pub fn target_heating_cooling_mode(&self) -> TargetHeatingCoolingMode {
        if self.is_bound() {
            TargetHeatingCoolingMode::Auto
        } else {
            TargetHeatingCoolingMode::Off
        }
    }

    /// The valve runs a single fixed mode; user writes are always rejected.
    ///
    /// # Errors
    ///
    /// Always returns [`StatusError::ServiceUnavailable`].
    pub fn set_target_heating_cooling_mode(
        &self,
        _mode: TargetHeatingCoolingMode,
    ) -> Result<(), StatusError> {
        Err(StatusError::ServiceUnavailable)
    }

    /// Display units characteristic, fixed to Celsius.
    #[must_use]
    pub fn temperature_display_units(&self) -> TemperatureDisplayUnits {
        TemperatureDisplayUnits::Celsius
    }

    /// Unit writes are always rejected.
    ///
    /// # Errors
    ///
    /// Always returns [`StatusError::ServiceUnavailable`].
    pub fn set_temperature_display_units(
        &self,
        _units: TemperatureDisplayUnits,
    ) -> Result<(), StatusError> {
        Err(StatusError::ServiceUnavailable)
    }

    /// Abort the poll task. Called once at host shutdown; the engine itself
    /// is never destroyed before the process exits.
    pub fn shutdown(&self) {
        if let Some(task) = self.lock_poll_task().take() {
            task.abort();
            tracing::debug!(address = %self.identity.address, "poll task aborted");
        }
    }

    fn lock_poll_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Periodic refresh task. One per engine, started on bind, aborted at
/// shutdown. Never exits on its own.
async fn poll_loop<V, P>(
    shared: Arc<Shared<V>>,
    updates: P,
    identity: AccessoryIdentity,
    interval: Duration,
) where
    V: ValveHandle,
    P: UpdatePublisher,
{
    loop {
        tokio::time::sleep(interval).await;
        poll_cycle(&shared, &updates, &identity).await;
    }
}

/// One telemetry refresh: the current temperature first, then the target
/// temperature (only when no write is in flight). The reads are sequential
/// because the valve services one request at a time. Each step catches its
/// own failure; a failed read skips that update until the next tick.
async fn poll_cycle<V, P>(shared: &Shared<V>, updates: &P, identity: &AccessoryIdentity)
where
    V: ValveHandle,
    P: UpdatePublisher,
{
    let Some(valve) = shared.state().valve.clone() else {
        return;
    };

    match valve.current_temperature().await {
        Ok(value) => {
            shared.state().current_temperature = value;
            publish(
                updates,
                identity,
                CharacteristicUpdate::CurrentTemperature(floor_clamped(value)),
            )
            .await;
        }
        Err(err) => {
            tracing::warn!(%err, address = %identity.address, "failed to read current temperature");
        }
    }

    // Never read the setpoint back while a write is in flight.
    if shared.write_in_flight() {
        return;
    }

    match valve.target_temperature().await {
        Ok(value) => {
            shared.state().target_temperature = value;
            publish(
                updates,
                identity,
                CharacteristicUpdate::TargetTemperature(floor_clamped(value)),
            )
            .await;
        }
        Err(err) => {
            tracing::warn!(%err, address = %identity.address, "failed to read target temperature");
        }
    }
}

async fn publish<P: UpdatePublisher>(
    updates: &P,
    identity: &AccessoryIdentity,
    update: CharacteristicUpdate,
) {
    if let Err(err) = updates.publish(identity.uuid, update).await {
        tracing::warn!(
            %err,
            address = %identity.address,
            "failed to publish characteristic update"
        );
    }
}
