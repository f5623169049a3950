// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::Serialize;

/// Lifecycle state of the connectivity state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    /// Created, nothing started yet
    #[default]
    Initial,
    /// Looking for a usable access point
    NetworkScanning,
    /// Associating with the picked access point
    ConnectingToWifi,
    /// Link is up, attaching to a known host
    ConnectingToServer,
    /// Session established
    Connected,
}

impl ConnectivityState {
    pub const ALL: [ConnectivityState; 5] = [
        Self::Initial,
        Self::NetworkScanning,
        Self::ConnectingToWifi,
        Self::ConnectingToServer,
        Self::Connected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::NetworkScanning => "NETWORK_SCANNING",
            Self::ConnectingToWifi => "CONNECTING_TO_WIFI",
            Self::ConnectingToServer => "CONNECTING_TO_SERVER",
            Self::Connected => "CONNECTED",
        }
    }

    /// Check if the device has an established server session.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
