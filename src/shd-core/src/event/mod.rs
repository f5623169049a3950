// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Event values passed through the dispatcher.
//!
//! An [`Event`] is a small identifier plus a fixed-capacity byte payload.
//! Events have value semantics: cloning copies the payload, nothing is
//! shared between copies.

pub mod dispatcher;

use std::fmt;

use thiserror::Error;

/// Maximum number of payload bytes an event can carry.
pub const EVENT_PAYLOAD_CAPACITY: usize = 512;

/// Identifier tag of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u8);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event payload of {len} bytes exceeds capacity of {capacity} bytes")]
    PayloadTooLarge { len: usize, capacity: usize },

    #[error("malformed payload for event {0}: {1}")]
    MalformedPayload(EventId, String),

    #[error("unknown event identifier {0}")]
    UnknownEvent(EventId),
}

/// Identifier-tagged event with an inline payload buffer.
#[derive(Clone)]
pub struct Event {
    id: EventId,
    payload: [u8; EVENT_PAYLOAD_CAPACITY],
    len: usize,
}

impl Event {
    /// Create an event without payload.
    pub fn new(id: EventId) -> Self {
        Self {
            id,
            payload: [0; EVENT_PAYLOAD_CAPACITY],
            len: 0,
        }
    }

    /// Create an event carrying a copy of `data`.
    pub fn with_payload(id: EventId, data: &[u8]) -> Result<Self, EventError> {
        if data.len() > EVENT_PAYLOAD_CAPACITY {
            return Err(EventError::PayloadTooLarge {
                len: data.len(),
                capacity: EVENT_PAYLOAD_CAPACITY,
            });
        }
        let mut event = Self::new(id);
        event.payload[..data.len()].copy_from_slice(data);
        event.len = data.len();
        Ok(event)
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    /// Payload bytes, empty when the event carries no data.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.payload() == other.payload()
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_event_has_no_payload() {
        let event = Event::new(EventId(3));
        assert_eq!(event.id(), EventId(3));
        assert!(event.is_empty());
        assert!(event.payload().is_empty());
    }

    #[test]
    fn test_clone_copies_payload() {
        let original = Event::with_payload(EventId(1), b"hello").unwrap();
        let copy = original.clone();
        assert_eq!(copy.payload(), b"hello");
        assert_eq!(copy, original);
    }

    #[test]
    fn test_payload_at_capacity_is_accepted() {
        let data = vec![0xAB; EVENT_PAYLOAD_CAPACITY];
        let event = Event::with_payload(EventId(9), &data).unwrap();
        assert_eq!(event.len(), EVENT_PAYLOAD_CAPACITY);
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let data = vec![0; EVENT_PAYLOAD_CAPACITY + 1];
        let err = Event::with_payload(EventId(9), &data).unwrap_err();
        assert_eq!(
            err,
            EventError::PayloadTooLarge {
                len: EVENT_PAYLOAD_CAPACITY + 1,
                capacity: EVENT_PAYLOAD_CAPACITY,
            }
        );
    }
}
