// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Typed event payloads.
//!
//! [`EventData`] is what state machine actions receive. It is packed into an
//! [`Event`]'s byte buffer as JSON when published and unpacked again when the
//! event is delivered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventError, EventId};
use crate::timer::TimerHandle;

/// Access point discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub ssid: String,
    pub channel: u8,
    /// Received signal strength in dBm (closer to zero is stronger).
    pub rssi: i32,
    pub is_open: bool,
}

/// Server endpoint candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Payload carried by a connectivity event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventData {
    #[default]
    None,
    Network(NetworkInfo),
    Host(HostInfo),
    /// Human-readable failure description
    Error(String),
    /// Opaque text forwarded from a server response
    Response(String),
    Timer(TimerHandle),
}

impl EventData {
    /// Pack this payload into an event with identifier `id`.
    pub fn into_event(self, id: EventId) -> Result<Event, EventError> {
        if matches!(self, EventData::None) {
            return Ok(Event::new(id));
        }
        let bytes = serde_json::to_vec(&self)
            .map_err(|e| EventError::MalformedPayload(id, e.to_string()))?;
        Event::with_payload(id, &bytes)
    }

    /// Unpack the payload of `event`. An empty payload yields `EventData::None`.
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        if event.is_empty() {
            return Ok(EventData::None);
        }
        serde_json::from_slice(event.payload())
            .map_err(|e| EventError::MalformedPayload(event.id(), e.to_string()))
    }

    pub fn network(&self) -> Option<&NetworkInfo> {
        match self {
            Self::Network(info) => Some(info),
            _ => None,
        }
    }

    pub fn host(&self) -> Option<&HostInfo> {
        match self {
            Self::Host(info) => Some(info),
            _ => None,
        }
    }

    /// Text of an `Error` or `Response` payload.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Error(text) | Self::Response(text) => Some(text),
            _ => None,
        }
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        match self {
            Self::Timer(handle) => Some(*handle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EVENT_PAYLOAD_CAPACITY;

    #[test]
    fn test_none_packs_to_empty_event() {
        let event = EventData::None.into_event(EventId(0)).unwrap();
        assert!(event.is_empty());
        assert_eq!(EventData::from_event(&event).unwrap(), EventData::None);
    }

    #[test]
    fn test_network_payload_survives_the_queue() {
        let data = EventData::Network(NetworkInfo {
            ssid: "attic".to_string(),
            channel: 6,
            rssi: -48,
            is_open: false,
        });
        let event = data.clone().into_event(EventId(1)).unwrap();
        assert_eq!(EventData::from_event(&event).unwrap(), data);
        assert_eq!(data.network().map(|n| n.channel), Some(6));
        assert!(data.host().is_none());
    }

    #[test]
    fn test_oversized_text_is_rejected() {
        let data = EventData::Response("x".repeat(EVENT_PAYLOAD_CAPACITY));
        assert!(matches!(
            data.into_event(EventId(16)),
            Err(EventError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_garbage_payload_is_reported() {
        let event = Event::with_payload(EventId(4), b"\x00\x01").unwrap();
        assert!(matches!(
            EventData::from_event(&event),
            Err(EventError::MalformedPayload(EventId(4), _))
        ));
    }

    #[test]
    fn test_host_display() {
        let host = HostInfo {
            host: "10.0.0.2".to_string(),
            port: 8080,
        };
        assert_eq!(host.to_string(), "10.0.0.2:8080");
    }
}
