// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Device/server protocol for shd-rs.
//!
//! This crate provides the text wire framing exchanged over the socket and
//! the JSON status envelope carried in message bodies.

pub mod envelope;
pub mod wire;

// Re-export commonly used items
pub use envelope::{classify_response, StatusEnvelope, EVENT_DEVICE_ONLINE, EVENT_DEVICE_STATUS};
pub use wire::{Method, StartLine, StatusClass, Version, WireError, WireMessage};
