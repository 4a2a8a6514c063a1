//! # valvebridged — radiator valve bridge daemon
//!
//! Composition root that wires the adapters to the accessory core and runs
//! the bridge.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Initialize tracing
//! - Open the JSON accessory cache and replay cached identities
//! - Construct the BLE scanner, update bus, and orchestrator
//! - Translate process signals into host lifecycle events
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use valvebridge_adapter_ble::ValveScanner;
use valvebridge_adapter_cache_json::JsonAccessoryCache;
use valvebridge_app::orchestrator::{HostEvent, Orchestrator};
use valvebridge_app::ports::AccessoryRegistry as _;
use valvebridge_app::update_bus::InProcessUpdateBus;

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Adapters
    let cache = JsonAccessoryCache::open(&config.cache.path)?;
    let scanner = ValveScanner::new(config.ble.clone());
    let updates = InProcessUpdateBus::new(256);

    // Characteristic updates have no network consumer in this build; log them.
    let mut update_rx = updates.subscribe();
    tokio::spawn(async move {
        while let Ok(update) = update_rx.recv().await {
            tracing::info!(
                accessory = %update.accessory,
                update = ?update.update,
                "characteristic update"
            );
        }
    });

    // Lifecycle: replay cached accessories, then ready, then ctrl-c shutdown.
    let restored = cache.load_all().await?;
    let (host_tx, host_rx) = mpsc::channel(restored.len() + 2);
    for identity in restored {
        host_tx.send(HostEvent::Restored(identity)).await?;
    }
    host_tx.send(HostEvent::Ready).await?;

    tokio::spawn({
        let host_tx = host_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                let _ = host_tx.send(HostEvent::Shutdown).await;
            }
        }
    });

    let mut orchestrator = Orchestrator::new(scanner, cache, updates, config.poll_interval());
    orchestrator.run(host_rx).await;

    Ok(())
}
