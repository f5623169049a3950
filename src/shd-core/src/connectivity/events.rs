// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use crate::event::{EventError, EventId};

/// Events that drive the connectivity state machine.
///
/// Each variant owns a fixed dispatcher identifier (its discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectivityEvent {
    Start = 0,
    NetworkScanResultsReady = 1,
    NetworkScanFailed = 2,
    NetworkScanTimeout = 3,
    NetworkPicked = 4,
    WifiConnected = 5,
    WifiConnectionFailed = 6,
    WifiConnectionRetriesExhausted = 7,
    WifiConnectionTimeout = 8,
    ServerPicked = 9,
    ServerConnected = 10,
    ServerConnectionFailed = 11,
    ServerConnectionRetriesExhausted = 12,
    ServerConnectionTimeout = 13,
    DeviceStatusRequestTimeout = 14,
    DataAvailable = 15,
    DeviceIdReceived = 16,
    DeviceIdError = 17,
    Disconnected = 18,
    TimerExpired = 19,
    FatalError = 20,
}

impl ConnectivityEvent {
    pub const ALL: [ConnectivityEvent; 21] = [
        Self::Start,
        Self::NetworkScanResultsReady,
        Self::NetworkScanFailed,
        Self::NetworkScanTimeout,
        Self::NetworkPicked,
        Self::WifiConnected,
        Self::WifiConnectionFailed,
        Self::WifiConnectionRetriesExhausted,
        Self::WifiConnectionTimeout,
        Self::ServerPicked,
        Self::ServerConnected,
        Self::ServerConnectionFailed,
        Self::ServerConnectionRetriesExhausted,
        Self::ServerConnectionTimeout,
        Self::DeviceStatusRequestTimeout,
        Self::DataAvailable,
        Self::DeviceIdReceived,
        Self::DeviceIdError,
        Self::Disconnected,
        Self::TimerExpired,
        Self::FatalError,
    ];

    /// Dispatcher identifier of this event.
    pub fn id(self) -> EventId {
        EventId(self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::NetworkScanResultsReady => "NETWORK_SCAN_RESULTS_READY",
            Self::NetworkScanFailed => "NETWORK_SCAN_FAILED",
            Self::NetworkScanTimeout => "NETWORK_SCAN_TIMEOUT",
            Self::NetworkPicked => "NETWORK_PICKED",
            Self::WifiConnected => "WIFI_CONNECTED",
            Self::WifiConnectionFailed => "WIFI_CONNECTION_FAILED",
            Self::WifiConnectionRetriesExhausted => "WIFI_CONNECTION_RETRIES_EXHAUSTED",
            Self::WifiConnectionTimeout => "WIFI_CONNECTION_TIMEOUT",
            Self::ServerPicked => "SERVER_PICKED",
            Self::ServerConnected => "SERVER_CONNECTED",
            Self::ServerConnectionFailed => "SERVER_CONNECTION_FAILED",
            Self::ServerConnectionRetriesExhausted => "SERVER_CONNECTION_RETRIES_EXHAUSTED",
            Self::ServerConnectionTimeout => "SERVER_CONNECTION_TIMEOUT",
            Self::DeviceStatusRequestTimeout => "DEVICE_STATUS_REQUEST_TIMEOUT",
            Self::DataAvailable => "DATA_AVAILABLE",
            Self::DeviceIdReceived => "DEVICE_ID_RECEIVED",
            Self::DeviceIdError => "DEVICE_ID_ERROR",
            Self::Disconnected => "DISCONNECTED",
            Self::TimerExpired => "TIMER_EXPIRED",
            Self::FatalError => "FATAL_ERROR",
        }
    }
}

impl TryFrom<EventId> for ConnectivityEvent {
    type Error = EventError;

    fn try_from(id: EventId) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id.0))
            .copied()
            .ok_or(EventError::UnknownEvent(id))
    }
}

impl fmt::Display for ConnectivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
