// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON status envelope carried in message bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shd_core::{ConnectivityEvent, ParameterList};

use crate::wire::StatusClass;

pub const EVENT_DEVICE_ONLINE: &str = "deviceOnline";
pub const EVENT_DEVICE_STATUS: &str = "deviceStatus";

/// Event names answered with a device identity on success.
const SUCCESS_TABLE: &[(&str, ConnectivityEvent)] = &[
    (EVENT_DEVICE_ONLINE, ConnectivityEvent::DeviceIdReceived),
    (EVENT_DEVICE_STATUS, ConnectivityEvent::DeviceIdReceived),
];

/// Event names whose failure invalidates the current session.
const FAILURE_TABLE: &[(&str, ConnectivityEvent)] = &[
    (EVENT_DEVICE_ONLINE, ConnectivityEvent::DeviceIdError),
    (EVENT_DEVICE_STATUS, ConnectivityEvent::DeviceIdError),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEnvelope {
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParameterList>,
}

impl StatusEnvelope {
    /// Announcement sent right after the server session is established.
    pub fn device_online(parameters: &ParameterList) -> Self {
        Self {
            event_name: EVENT_DEVICE_ONLINE.to_string(),
            response_data: None,
            parameters: Some(parameters.clone()),
        }
    }

    /// Status reply carrying the device identifier.
    pub fn device_status(device_id: u32) -> Self {
        Self {
            event_name: EVENT_DEVICE_STATUS.to_string(),
            response_data: Some(Value::String(device_id.to_string())),
            parameters: None,
        }
    }

    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Response data as opaque text. Strings are returned unquoted, other
    /// JSON values in their compact form.
    pub fn response_text(&self) -> String {
        match &self.response_data {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

/// Map a response's status class and envelope event name to the connectivity
/// event it triggers, if any.
pub fn classify_response(class: StatusClass, event_name: &str) -> Option<ConnectivityEvent> {
    let table = match class {
        StatusClass::Success => SUCCESS_TABLE,
        StatusClass::ClientError => FAILURE_TABLE,
        _ => return None,
    };
    table
        .iter()
        .find(|(name, _)| *name == event_name)
        .map(|(_, event)| *event)
}
