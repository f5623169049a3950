// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Named device parameters reported to the server.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PARAM_DEVICE_ID: &str = "deviceId";
pub const PARAM_DEVICE_NAME: &str = "deviceName";
pub const PARAM_STATUS: &str = "status";

pub const STATUS_ONLINE: &str = "online";
pub const STATUS_OFFLINE: &str = "offline";

/// Presentation type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Checkbox,
    Combobox,
    Textbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("parameter '{0}' already exists")]
    Duplicate(String),

    #[error("parameter '{0}' is read-only")]
    ReadOnly(String),

    #[error("value '{value}' is not allowed for parameter '{name}'")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub current_value: String,
    /// Allowed values of a combobox; empty for other kinds.
    #[serde(default)]
    pub values: Vec<String>,
}

impl DeviceParameter {
    pub fn textbox(name: &str, value: &str, read_only: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Textbox,
            read_only,
            current_value: value.to_string(),
            values: Vec::new(),
        }
    }

    pub fn checkbox(name: &str, checked: bool, read_only: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Checkbox,
            read_only,
            current_value: checked.to_string(),
            values: Vec::new(),
        }
    }

    pub fn combobox(name: &str, values: &[&str], current: &str, read_only: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: ParameterKind::Combobox,
            read_only,
            current_value: current.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Check if `value` is acceptable for this parameter's kind.
    pub fn accepts(&self, value: &str) -> bool {
        match self.kind {
            ParameterKind::Textbox => true,
            ParameterKind::Checkbox => matches!(value, "true" | "false"),
            ParameterKind::Combobox => self.values.iter().any(|v| v == value),
        }
    }
}

/// Ordered parameter set. Entries are only ever appended, never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterList {
    entries: Vec<DeviceParameter>,
}

impl ParameterList {
    /// Create a list holding the mandatory identity entries.
    pub fn with_identity(device_name: &str) -> Self {
        Self {
            entries: vec![
                DeviceParameter::textbox(PARAM_DEVICE_ID, "", true),
                DeviceParameter::textbox(PARAM_DEVICE_NAME, device_name, true),
                DeviceParameter::combobox(
                    PARAM_STATUS,
                    &[STATUS_ONLINE, STATUS_OFFLINE],
                    STATUS_OFFLINE,
                    true,
                ),
            ],
        }
    }

    pub fn add(&mut self, parameter: DeviceParameter) -> Result<(), ParameterError> {
        if self.get(&parameter.name).is_some() {
            return Err(ParameterError::Duplicate(parameter.name));
        }
        self.entries.push(parameter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DeviceParameter> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Value of parameter `name`, if present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|p| p.current_value.as_str())
    }

    /// Set a value on behalf of the device itself. Read-only entries may be
    /// written; allowed values are still enforced.
    pub fn set_value(&mut self, name: &str, value: &str) -> Result<(), ParameterError> {
        let entry = self.entry_mut(name)?;
        if !entry.accepts(value) {
            return Err(ParameterError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
        entry.current_value = value.to_string();
        Ok(())
    }

    /// Set a value requested by a remote party. Read-only entries are refused.
    pub fn update_from_remote(&mut self, name: &str, value: &str) -> Result<(), ParameterError> {
        if self.entry_mut(name)?.read_only {
            return Err(ParameterError::ReadOnly(name.to_string()));
        }
        self.set_value(name, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceParameter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut DeviceParameter, ParameterError> {
        self.entries
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ParameterError::Unknown(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_entries_come_first() {
        let params = ParameterList::with_identity("porch-light");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![PARAM_DEVICE_ID, PARAM_DEVICE_NAME, PARAM_STATUS]);
        assert_eq!(params.value(PARAM_DEVICE_NAME), Some("porch-light"));
        assert_eq!(params.value(PARAM_DEVICE_ID), Some(""));
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut params = ParameterList::with_identity("x");
        params
            .add(DeviceParameter::checkbox("power", false, false))
            .unwrap();
        assert_eq!(
            params.add(DeviceParameter::checkbox("power", true, false)),
            Err(ParameterError::Duplicate("power".to_string()))
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_remote_update_respects_read_only() {
        let mut params = ParameterList::with_identity("x");
        assert_eq!(
            params.update_from_remote(PARAM_DEVICE_ID, "5"),
            Err(ParameterError::ReadOnly(PARAM_DEVICE_ID.to_string()))
        );
        params.set_value(PARAM_DEVICE_ID, "5").unwrap();
        assert_eq!(params.value(PARAM_DEVICE_ID), Some("5"));
    }

    #[test]
    fn test_allowed_values_are_enforced() {
        let mut params = ParameterList::with_identity("x");
        params
            .add(DeviceParameter::combobox("mode", &["eco", "boost"], "eco", false))
            .unwrap();
        params
            .add(DeviceParameter::checkbox("power", false, false))
            .unwrap();

        assert!(params.update_from_remote("mode", "boost").is_ok());
        assert!(matches!(
            params.update_from_remote("mode", "turbo"),
            Err(ParameterError::InvalidValue { .. })
        ));
        assert!(params.update_from_remote("power", "true").is_ok());
        assert!(params.update_from_remote("power", "yes").is_err());
        assert_eq!(
            params.update_from_remote("missing", "1"),
            Err(ParameterError::Unknown("missing".to_string()))
        );
    }

    #[test]
    fn test_serializes_as_array() {
        let params = ParameterList::with_identity("lamp");
        let json = serde_json::to_value(&params).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["name"], "deviceId");
        assert_eq!(first["type"], "textbox");
        assert_eq!(first["readOnly"], true);
        assert_eq!(first["currentValue"], "");
        assert_eq!(json[2]["values"][0], "online");
    }
}
