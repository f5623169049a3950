// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod actions;
mod config;
mod device;
mod fsm;
mod session;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use shd_app::{init_logging, ConfigFile};
use shd_backend::{register_builtin_backends_on, RegistrationContext};
use shd_core::{DynResult, Hardware};

use config::DeviceConfig;
use device::Device;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - smart home device daemon");
const RESET_DELAY_MS: u64 = 500;

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Hardware backend to use (e.g. simulated)
    #[arg(short = 'b', long = "backend")]
    backend: Option<String>,
    /// Name announced to the server
    #[arg(short = 'n', long = "device-name")]
    device_name: Option<String>,
    /// Scheduler pass interval in milliseconds
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,
}

/// Merge CLI overrides into the loaded configuration.
fn apply_overrides(cli: &Cli, cfg: &mut DeviceConfig) {
    if let Some(ref backend) = cli.backend {
        cfg.backend.model = backend.clone();
    }
    if let Some(ref name) = cli.device_name {
        cfg.general.device_name = name.clone();
    }
    if let Some(tick_ms) = cli.tick_ms {
        cfg.general.tick_ms = tick_ms;
    }
}

fn build_device(
    registry: &RegistrationContext,
    cfg: &DeviceConfig,
) -> DynResult<Device<Box<dyn Hardware>>> {
    let hw = registry.build_hardware(&cfg.backend.model, &cfg.backend.simulation)?;
    let mut device = Device::new(hw, cfg)?;
    device.start();
    Ok(device)
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let mut registry = RegistrationContext::new();
    register_builtin_backends_on(&mut registry);

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", DeviceConfig::example_combined_toml());
        return Ok(());
    }

    let (mut cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = DeviceConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        DeviceConfig::load_from_default_paths()?
    };
    apply_overrides(&cli, &mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid device configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }
    if !registry.is_backend_registered(&cfg.backend.model) {
        return Err(format!(
            "Unknown hardware backend: {} (available: {})",
            cfg.backend.model,
            registry.registered_backends().join(", ")
        )
        .into());
    }
    if cfg.server.hosts.is_empty() {
        warn!("No server hosts configured, the device will reset once online");
    }

    info!(
        "Starting shd-device (name: {}, backend: {}, {} known networks, {} hosts)",
        cfg.general.device_name,
        cfg.backend.model,
        cfg.wifi.networks.len(),
        cfg.server.hosts.len()
    );

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut device = build_device(&registry, &cfg)?;
    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.general.tick_ms));

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res?;
                info!("Ctrl+C received, shutting down");
                device.terminate();
                return Ok(());
            }
            _ = ticker.tick() => {
                if device.run_pass() {
                    continue;
                }
                error!("Device halted in {}, restarting", device.state());
                tokio::time::sleep(Duration::from_millis(RESET_DELAY_MS)).await;
                device = build_device(&registry, &cfg)?;
            }
        }
    }
}
