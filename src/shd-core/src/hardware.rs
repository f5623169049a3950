// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Hardware capability interface.
//!
//! The orchestrator reaches the radio, the socket and the board only through
//! [`Hardware`]. Every call must return promptly; a backend that cannot
//! complete an operation in time reports failure and lets the orchestrator's
//! watchdog timers take over.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::connectivity::NetworkInfo;

/// Station link status as reported by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LinkStatus {
    #[default]
    Idle,
    NoSsidAvailable,
    ScanCompleted,
    Connected,
    ConnectFailed,
    ConnectionLost,
    Disconnected,
}

impl LinkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::NoSsidAvailable => "no-ssid-available",
            Self::ScanCompleted => "scan-completed",
            Self::Connected => "connected",
            Self::ConnectFailed => "connect-failed",
            Self::ConnectionLost => "connection-lost",
            Self::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("association with '{0}' failed")]
    AssociationFailed(String),

    #[error("connection to {host}:{port} failed")]
    ConnectFailed { host: String, port: u16 },

    #[error("socket is not connected")]
    NotConnected,

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Capabilities the connectivity core needs from the board.
pub trait Hardware {
    /// Associate with an access point. An open network takes an empty password.
    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), HardwareError>;

    fn disassociate(&mut self);

    /// Start a scan and return without waiting for it.
    fn scan(&mut self);

    /// Number of networks found once the last scan finished. Yields `Some`
    /// once per completed scan; a scan that never finishes is covered by
    /// the scan watchdog.
    fn poll_scan(&mut self) -> Option<usize>;

    /// Descriptor of the `index`-th network found by the last scan.
    fn network_info(&self, index: usize) -> Option<NetworkInfo>;

    fn socket_connect(&mut self, host: &str, port: u16) -> Result<(), HardwareError>;

    fn socket_disconnect(&mut self);

    fn socket_connected(&self) -> bool;

    /// Check if inbound bytes are waiting on the socket.
    fn data_available(&self) -> bool;

    /// Drain everything currently buffered on the socket.
    fn read_available(&mut self) -> Vec<u8>;

    fn send(&mut self, data: &[u8]) -> Result<(), HardwareError>;

    fn link_status(&self) -> LinkStatus;

    /// Milliseconds since an arbitrary, fixed origin.
    fn monotonic_time_ms(&self) -> u64;

    fn hardware_reset(&mut self);

    /// Write a line to the board's debug console.
    fn debug_write(&mut self, text: &str);
}

impl<H: Hardware + ?Sized> Hardware for Box<H> {
    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), HardwareError> {
        (**self).associate(ssid, password)
    }

    fn disassociate(&mut self) {
        (**self).disassociate()
    }

    fn scan(&mut self) {
        (**self).scan()
    }

    fn poll_scan(&mut self) -> Option<usize> {
        (**self).poll_scan()
    }

    fn network_info(&self, index: usize) -> Option<NetworkInfo> {
        (**self).network_info(index)
    }

    fn socket_connect(&mut self, host: &str, port: u16) -> Result<(), HardwareError> {
        (**self).socket_connect(host, port)
    }

    fn socket_disconnect(&mut self) {
        (**self).socket_disconnect()
    }

    fn socket_connected(&self) -> bool {
        (**self).socket_connected()
    }

    fn data_available(&self) -> bool {
        (**self).data_available()
    }

    fn read_available(&mut self) -> Vec<u8> {
        (**self).read_available()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        (**self).send(data)
    }

    fn link_status(&self) -> LinkStatus {
        (**self).link_status()
    }

    fn monotonic_time_ms(&self) -> u64 {
        (**self).monotonic_time_ms()
    }

    fn hardware_reset(&mut self) {
        (**self).hardware_reset()
    }

    fn debug_write(&mut self, text: &str) {
        (**self).debug_write(text)
    }
}
