// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Requests the device sends over an established server session.

use serde_json::Value;

use shd_core::ParameterList;
use shd_protocol::wire::{HEADER_CONTENT_LENGTH, HEADER_CONTENT_TYPE, HEADER_HOST};
use shd_protocol::{
    Method, StatusEnvelope, Version, WireMessage, EVENT_DEVICE_ONLINE, EVENT_DEVICE_STATUS,
};

const CONTENT_TYPE_JSON: &str = "application/json";

fn with_host(message: WireMessage, host: Option<&str>) -> WireMessage {
    match host {
        Some(host) => message.header(HEADER_HOST, host),
        None => message,
    }
}

/// Announce the device with its full parameter list.
pub fn device_online_request(
    host: Option<&str>,
    parameters: &ParameterList,
) -> Result<WireMessage, serde_json::Error> {
    let body = StatusEnvelope::device_online(parameters).to_json()?;
    let message = WireMessage::request(Method::Post, EVENT_DEVICE_ONLINE, Version::Http11);
    Ok(with_host(message, host)
        .header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
        .header(HEADER_CONTENT_LENGTH, &body.len().to_string())
        .body(&body))
}

/// Query the server for the status of device `device_id`.
pub fn device_status_request(host: Option<&str>, device_id: u32) -> WireMessage {
    let path = format!("{}?id={}", EVENT_DEVICE_STATUS, device_id);
    with_host(
        WireMessage::request(Method::Get, &path, Version::Http11),
        host,
    )
}

/// Extract a device identifier from response text.
///
/// Accepts a bare integer (`"42"`) or a JSON object with a `deviceId` field
/// holding a number or a numeric string.
pub fn parse_device_id(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(id) = text.parse::<u32>() {
        return Some(id);
    }
    let value: Value = serde_json::from_str(text).ok()?;
    match value.get("deviceId")? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
