//! Valve scanner — watches BLE central events and emits valve handles.
//!
//! [`ValveScanner`] implements the discovery port: it starts a scan filtered
//! by the valve service, wraps each matching advertisement in a
//! [`RadiatorValve`], and sends it into the discovery channel. The
//! orchestrator performs the actual connection attempt.

use std::time::Duration;

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;

use valvebridge_app::ports::ValveDiscovery;
use valvebridge_domain::error::BridgeError;

use crate::config::BleConfig;
use crate::error::BleError;
use crate::valve::{RadiatorValve, VALVE_SERVICE};

/// Discovery provider over a btleplug central adapter.
pub struct ValveScanner {
    config: BleConfig,
    central: Option<Adapter>,
    scan_task: Option<JoinHandle<()>>,
}

impl ValveScanner {
    /// Create a scanner with the given configuration. Scanning starts only
    /// when the discovery port's `start` is invoked.
    #[must_use]
    pub fn new(config: BleConfig) -> Self {
        Self {
            config,
            central: None,
            scan_task: None,
        }
    }

    /// Check whether the given MAC address passes the device filter.
    fn passes_filter(config: &BleConfig, mac: &str) -> bool {
        if config.device_filter.is_empty() {
            return true;
        }
        config
            .device_filter
            .iter()
            .any(|f| f.eq_ignore_ascii_case(mac))
    }

    /// Event loop of the background scan task. Ends when the central event
    /// stream closes or the discovery channel is dropped.
    async fn watch_events(central: Adapter, config: BleConfig, found: mpsc::Sender<RadiatorValve>) {
        let mut events = match central.events().await {
            Ok(events) => events,
            Err(err) => {
                tracing::error!(%err, "failed to subscribe to BLE central events");
                return;
            }
        };

        let io_timeout = Duration::from_secs(u64::from(config.io_timeout_secs));

        while let Some(event) = events.next().await {
            let CentralEvent::DeviceDiscovered(id) = event else {
                continue;
            };
            let Ok(peripheral) = central.peripheral(&id).await else {
                continue;
            };
            let Ok(Some(props)) = peripheral.properties().await else {
                continue;
            };

            let name_matches = props
                .local_name
                .as_deref()
                .is_some_and(|name| name.starts_with(&config.name_prefix));
            let service_matches = props.services.contains(&VALVE_SERVICE);
            if !name_matches && !service_matches {
                continue;
            }

            let mac = props.address.to_string();
            if !Self::passes_filter(&config, &mac) {
                tracing::debug!(%mac, "filtered out by device_filter");
                continue;
            }

            tracing::info!(%mac, name = ?props.local_name, "valve advertisement detected");
            let valve = RadiatorValve::new(peripheral, mac, io_timeout);
            if found.send(valve).await.is_err() {
                // Receiver gone: the orchestrator is shutting down.
                return;
            }
        }
    }
}

impl ValveDiscovery for ValveScanner {
    type Handle = RadiatorValve;

    async fn start(&mut self, found: mpsc::Sender<RadiatorValve>) -> Result<(), BridgeError> {
        let manager = Manager::new()
            .await
            .map_err(|err| BleError::Ble(err).into_domain())?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|err| BleError::Ble(err).into_domain())?;
        let central = adapters
            .into_iter()
            .next()
            .ok_or_else(|| BleError::NotAvailable.into_domain())?;

        central
            .start_scan(ScanFilter {
                services: vec![VALVE_SERVICE],
            })
            .await
            .map_err(|err| BleError::Ble(err).into_domain())?;

        tracing::info!("valve scan started");

        let task = tokio::spawn(Self::watch_events(
            central.clone(),
            self.config.clone(),
            found,
        ));
        self.central = Some(central);
        self.scan_task = Some(task);
        Ok(())
    }

    async fn disconnect_all(&mut self) -> Result<(), BridgeError> {
        if let Some(task) = self.scan_task.take() {
            task.abort();
            tracing::debug!("valve scan task aborted");
        }

        // Never started, or teardown already ran.
        let Some(central) = self.central.take() else {
            return Ok(());
        };

        if let Err(err) = central.stop_scan().await {
            tracing::warn!(%err, "failed to stop BLE scan");
        }

        match central.peripherals().await {
            Ok(peripherals) => {
                for peripheral in peripherals {
                    if peripheral.is_connected().await.unwrap_or(false) {
                        if let Err(err) = peripheral.disconnect().await {
                            tracing::warn!(%err, "failed to disconnect peripheral");
                        }
                    }
                }
            }
            Err(err) => tracing::warn!(%err, "failed to list peripherals during teardown"),
        }

        tracing::info!("valve discovery stopped");
        Ok(())
    }
}
