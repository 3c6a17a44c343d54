//! # hmvid: virtual device daemon
//!
//! Composition root that wires the template adapter into the device
//! factory and keeps the configured devices alive.
//!
//! ## Responsibilities
//! - Parse configuration (CLI arg, env vars, config file)
//! - Install the tracing subscriber
//! - Restore each configured device from its snapshot, or build it from its template
//! - Log device-level value-change events
//! - Save snapshots on shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod state;

use hmvi_adapter_templates_fs::FsTemplateSource;
use hmvi_app::services::device_factory::DeviceFactory;
use hmvi_domain::device::Device;
use hmvi_domain::event::{ChangeKind, DeviceEventReceiver};
use tracing_subscriber::EnvFilter;

use config::Config;
use state::SnapshotDir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hmvid.toml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    tracing::info!(
        config = %config_path,
        templates = %config.templates.dir.display(),
        devices = config.devices.len(),
        "hmvid starting"
    );

    let factory = DeviceFactory::new(FsTemplateSource::new(&config.templates.dir));
    let store = config.state.dir.as_deref().map(SnapshotDir::new);

    let mut devices: Vec<Device> = Vec::with_capacity(config.devices.len());
    for entry in &config.devices {
        let stored = store
            .as_ref()
            .and_then(|store| store.load_or_skip(&entry.address));
        let device =
            match factory.restore_or_create(&entry.device_type, &entry.address, stored.as_deref())
            {
                Ok(device) => device,
                Err(err) => {
                    tracing::error!(
                        device_type = %entry.device_type,
                        address = %entry.address,
                        error = %err,
                        "cannot build device"
                    );
                    continue;
                }
            };

        let description = serde_json::to_string(&device.get_device_description())?;
        tracing::info!(address = %entry.address, %description, "device ready");

        for kind in [ChangeKind::Value, ChangeKind::Event] {
            tokio::spawn(log_events(device.subscribe(kind)));
        }
        devices.push(device);
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("hmvid shutting down");

    if let Some(store) = &store {
        for device in &devices {
            store.persist(device);
        }
    }

    Ok(())
}

async fn log_events(mut events: DeviceEventReceiver) {
    while let Some(event) = events.recv().await {
        tracing::info!(
            event = event.name(),
            device = ?event.change.device,
            channel = %event.change.channel,
            paramset = %event.change.paramset,
            parameter = %event.change.name,
            value = ?event.change.value,
            emitted_at = %event.emitted_at,
            "device event"
        );
    }
}
