// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shd_core::{DynResult, Hardware, NetworkInfo};

mod simulated;

pub use simulated::SimulatedHardware;

/// Settings handed to a backend factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    /// Networks a simulated radio reports on every scan
    pub networks: Vec<NetworkInfo>,
    /// Identifier the simulated server assigns, if it should answer at all
    pub device_id: Option<u32>,
    /// Scheduler passes a simulated scan stays busy
    pub scan_delay: u32,
}

pub type BackendFactory = fn(&BackendOptions) -> DynResult<Box<dyn Hardware>>;

/// Context for registering and instantiating hardware backends.
#[derive(Clone)]
pub struct RegistrationContext {
    factories: HashMap<String, BackendFactory>,
}

impl RegistrationContext {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory under a stable name (e.g. "simulated").
    pub fn register_backend(&mut self, name: &str, factory: BackendFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_backend_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    /// List registered backend names.
    pub fn registered_backends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate the backend registered as `name`.
    pub fn build_hardware(
        &self,
        name: &str,
        options: &BackendOptions,
    ) -> DynResult<Box<dyn Hardware>> {
        let factory = self
            .factories
            .get(&normalize_name(name))
            .ok_or_else(|| format!("Unknown hardware backend: {}", name))?;
        factory(options)
    }
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Register all built-in backends on a context.
pub fn register_builtin_backends_on(context: &mut RegistrationContext) {
    context.register_backend("simulated", simulated_factory);
}

fn simulated_factory(options: &BackendOptions) -> DynResult<Box<dyn Hardware>> {
    let mut hw = SimulatedHardware::new()
        .with_wall_clock()
        .with_networks(options.networks.clone());
    hw.set_scan_delay(options.scan_delay);
    if let Some(id) = options.device_id {
        hw = hw.with_server_device_id(id);
    }
    Ok(Box::new(hw))
}
