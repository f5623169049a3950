// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for shd-device.
//!
//! Config is loaded from the `[shd-device]` section of `shd-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./shd-rs.toml`
//! 3. `~/.config/shd-rs/shd-rs.toml`
//! 4. `/etc/shd-rs/shd-rs.toml`

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shd_app::ConfigFile;
use shd_backend::BackendOptions;
use shd_core::parameter::{PARAM_DEVICE_ID, PARAM_DEVICE_NAME, PARAM_STATUS};
use shd_core::{DeviceParameter, NetworkInfo, ParameterKind};

/// Top-level device configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Hardware backend selection
    pub backend: BackendConfig,
    /// Known networks and association policy
    pub wifi: WifiConfig,
    /// Known hosts and connection policy
    pub server: ServerConfig,
    /// Session keep-alive
    pub status: StatusConfig,
    /// Extra parameters reported next to the identity entries
    pub parameters: Vec<DeviceParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
    /// Name announced to the server
    pub device_name: String,
    /// Scheduler pass interval
    pub tick_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            device_name: "shd-device".to_string(),
            tick_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Registered backend name (e.g. "simulated")
    pub model: String,
    /// Options passed to the backend factory
    pub simulation: BackendOptions,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: "simulated".to_string(),
            simulation: BackendOptions::default(),
        }
    }
}

/// Access point with a stored credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownNetwork {
    pub ssid: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub networks: Vec<KnownNetwork>,
    /// Failed associations tolerated before rescanning
    pub max_retries: u32,
    pub scan_timeout_ms: u64,
    pub connection_timeout_ms: u64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            networks: Vec::new(),
            max_retries: 3,
            scan_timeout_ms: 10_000,
            connection_timeout_ms: 15_000,
        }
    }
}

/// Server endpoint candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownHost {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hosts: Vec<KnownHost>,
    /// Failed socket connects tolerated before rescanning
    pub max_retries: u32,
    pub connection_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            max_retries: 3,
            connection_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Interval between device status queries while connected
    pub request_interval_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            request_interval_ms: 30_000,
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if self.general.device_name.trim().is_empty() {
            return Err("[general].device_name must not be empty".to_string());
        }
        if self.general.tick_ms == 0 {
            return Err("[general].tick_ms must be > 0".to_string());
        }
        if self.backend.model.trim().is_empty() {
            return Err("[backend].model must not be empty".to_string());
        }

        if self.wifi.networks.iter().any(|n| n.ssid.trim().is_empty()) {
            return Err("[wifi].networks must not contain an empty ssid".to_string());
        }
        if self.wifi.max_retries == 0 {
            return Err("[wifi].max_retries must be > 0".to_string());
        }
        if self.wifi.scan_timeout_ms == 0 {
            return Err("[wifi].scan_timeout_ms must be > 0".to_string());
        }
        if self.wifi.connection_timeout_ms == 0 {
            return Err("[wifi].connection_timeout_ms must be > 0".to_string());
        }

        for host in &self.server.hosts {
            if host.host.trim().is_empty() {
                return Err("[server].hosts must not contain an empty host".to_string());
            }
            if host.port == 0 {
                return Err(format!("[server].hosts port for '{}' must be > 0", host.host));
            }
        }
        if self.server.max_retries == 0 {
            return Err("[server].max_retries must be > 0".to_string());
        }
        if self.server.connection_timeout_ms == 0 {
            return Err("[server].connection_timeout_ms must be > 0".to_string());
        }
        if self.status.request_interval_ms == 0 {
            return Err("[status].request_interval_ms must be > 0".to_string());
        }

        validate_parameters(&self.parameters)
    }

    /// Generate an example configuration wrapped under the `[shd-device]`
    /// section header, suitable for use in a combined `shd-rs.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "shd-device")]
            inner: DeviceConfig,
        }
        let example = DeviceConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
                ..GeneralConfig::default()
            },
            backend: BackendConfig {
                model: "simulated".to_string(),
                simulation: BackendOptions {
                    networks: vec![NetworkInfo {
                        ssid: "home".to_string(),
                        channel: 6,
                        rssi: -55,
                        is_open: false,
                    }],
                    device_id: Some(1),
                    scan_delay: 3,
                },
            },
            wifi: WifiConfig {
                networks: vec![KnownNetwork {
                    ssid: "home".to_string(),
                    password: "changeme".to_string(),
                }],
                ..WifiConfig::default()
            },
            server: ServerConfig {
                hosts: vec![KnownHost {
                    host: "192.168.1.10".to_string(),
                    port: 8080,
                }],
                ..ServerConfig::default()
            },
            status: StatusConfig::default(),
            parameters: vec![DeviceParameter::checkbox("power", false, false)],
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

fn validate_parameters(parameters: &[DeviceParameter]) -> Result<(), String> {
    let mut seen: HashSet<&str> = [PARAM_DEVICE_ID, PARAM_DEVICE_NAME, PARAM_STATUS]
        .into_iter()
        .collect();
    for param in parameters {
        if param.name.trim().is_empty() {
            return Err("[[parameters]].name must not be empty".to_string());
        }
        if !seen.insert(param.name.as_str()) {
            return Err(format!("[[parameters]] '{}' is defined twice", param.name));
        }
        if param.kind == ParameterKind::Combobox && param.values.is_empty() {
            return Err(format!(
                "[[parameters]] '{}' is a combobox without values",
                param.name
            ));
        }
        if !param.accepts(&param.current_value) {
            return Err(format!(
                "[[parameters]] '{}' has invalid current_value '{}'",
                param.name, param.current_value
            ));
        }
    }
    Ok(())
}

impl ConfigFile for DeviceConfig {
    fn section_key() -> &'static str {
        "shd-device"
    }
}
