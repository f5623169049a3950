// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Connectivity vocabulary.
//!
//! This module contains the closed sets of states and events driving the
//! device's scan → associate → connect → maintain lifecycle, and the typed
//! payload carried by those events.

pub mod events;
pub mod payload;
pub mod state;

pub use events::ConnectivityEvent;
pub use payload::{EventData, HostInfo, NetworkInfo};
pub use state::ConnectivityState;
