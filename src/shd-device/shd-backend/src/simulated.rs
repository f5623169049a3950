// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated radio and socket for development and testing.
//!
//! Holds link and socket state in memory and answers every call immediately.
//! Tests script scan results and failures up front and inspect what the
//! device sent; the binary uses the wall clock and the built-in server
//! emulation instead.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info};

use shd_core::{Hardware, HardwareError, LinkStatus, NetworkInfo};
use shd_protocol::{
    StatusEnvelope, Version, WireMessage, EVENT_DEVICE_ONLINE, EVENT_DEVICE_STATUS,
};

enum Clock {
    Manual(u64),
    Wall(Instant),
}

pub struct SimulatedHardware {
    networks: Vec<NetworkInfo>,
    last_scan: Vec<NetworkInfo>,
    scan_completes: bool,
    scan_delay: u32,
    scan_pending: Option<u32>,
    scans: u32,
    link: LinkStatus,
    associated_ssid: Option<String>,
    failing_associations: u32,
    reject_associations: bool,
    associations: Vec<(String, String)>,
    socket: Option<(String, u16)>,
    failing_connects: u32,
    reject_connects: bool,
    connections: Vec<(String, u16)>,
    inbound: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
    server_device_id: Option<u32>,
    resets: u32,
    debug_lines: Vec<String>,
    clock: Clock,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHardware {
    /// Create a simulator with no networks and a manual clock at 0 ms.
    pub fn new() -> Self {
        Self {
            networks: Vec::new(),
            last_scan: Vec::new(),
            scan_completes: true,
            scan_delay: 0,
            scan_pending: None,
            scans: 0,
            link: LinkStatus::Idle,
            associated_ssid: None,
            failing_associations: 0,
            reject_associations: false,
            associations: Vec::new(),
            socket: None,
            failing_connects: 0,
            reject_connects: false,
            connections: Vec::new(),
            inbound: VecDeque::new(),
            sent: Vec::new(),
            server_device_id: None,
            resets: 0,
            debug_lines: Vec::new(),
            clock: Clock::Manual(0),
        }
    }

    /// Use the host's monotonic clock instead of the manual one.
    pub fn with_wall_clock(mut self) -> Self {
        self.clock = Clock::Wall(Instant::now());
        self
    }

    pub fn with_networks(mut self, networks: Vec<NetworkInfo>) -> Self {
        self.networks = networks;
        self
    }

    /// Answer "device online" and status requests with `device_id`.
    pub fn with_server_device_id(mut self, device_id: u32) -> Self {
        self.server_device_id = Some(device_id);
        self
    }

    pub fn add_network(&mut self, network: NetworkInfo) {
        self.networks.push(network);
    }

    /// When `false`, scans never report completion.
    pub fn set_scan_completes(&mut self, completes: bool) {
        self.scan_completes = completes;
    }

    /// Number of polls a scan stays busy before reporting its results.
    pub fn set_scan_delay(&mut self, polls: u32) {
        self.scan_delay = polls;
    }

    /// Make the next `count` association attempts fail.
    pub fn fail_next_associations(&mut self, count: u32) {
        self.failing_associations = count;
    }

    pub fn reject_associations(&mut self, reject: bool) {
        self.reject_associations = reject;
    }

    /// Make the next `count` socket connects fail.
    pub fn fail_next_connects(&mut self, count: u32) {
        self.failing_connects = count;
    }

    pub fn reject_connects(&mut self, reject: bool) {
        self.reject_connects = reject;
    }

    /// Queue bytes as if received from the server.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.extend(data);
    }

    /// Lose the radio link, closing the socket with it.
    pub fn drop_link(&mut self) {
        self.link = LinkStatus::ConnectionLost;
        self.associated_ssid = None;
        self.socket = None;
    }

    /// Close the socket from the remote side.
    pub fn drop_socket(&mut self) {
        self.socket = None;
    }

    /// Advance the manual clock. Has no effect on a wall clock.
    pub fn advance(&mut self, ms: u64) {
        if let Clock::Manual(now) = &mut self.clock {
            *now = now.saturating_add(ms);
        }
    }

    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    /// Sent payloads decoded as UTF-8, lossy.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect()
    }

    pub fn associations(&self) -> &[(String, String)] {
        &self.associations
    }

    pub fn connections(&self) -> &[(String, u16)] {
        &self.connections
    }

    pub fn associated_ssid(&self) -> Option<&str> {
        self.associated_ssid.as_deref()
    }

    pub fn scan_count(&self) -> u32 {
        self.scans
    }

    pub fn reset_count(&self) -> u32 {
        self.resets
    }

    pub fn debug_lines(&self) -> &[String] {
        &self.debug_lines
    }

    fn serve(&mut self, data: &[u8]) {
        let Some(device_id) = self.server_device_id else {
            return;
        };
        let Ok(request) = WireMessage::parse(&String::from_utf8_lossy(data)) else {
            return;
        };
        let event_name = match request.path() {
            Some(EVENT_DEVICE_ONLINE) => EVENT_DEVICE_ONLINE,
            Some(path) if path.starts_with(EVENT_DEVICE_STATUS) => EVENT_DEVICE_STATUS,
            _ => return,
        };

        let mut envelope = StatusEnvelope::device_status(device_id);
        envelope.event_name = event_name.to_string();
        let Ok(body) = envelope.to_json() else {
            return;
        };
        let response = WireMessage::response(Version::Http11, 200)
            .header("Content-Type", "application/json")
            .header("Content-Length", &body.len().to_string())
            .body(&body)
            .encode();
        debug!("Simulated server answers {} with id {}", event_name, device_id);
        self.inbound.extend(response.as_bytes());
    }
}

impl Hardware for SimulatedHardware {
    fn associate(&mut self, ssid: &str, password: &str) -> Result<(), HardwareError> {
        self.associations
            .push((ssid.to_string(), password.to_string()));
        let visible = self.networks.iter().any(|n| n.ssid == ssid);
        if self.reject_associations || !visible {
            self.link = LinkStatus::ConnectFailed;
            return Err(HardwareError::AssociationFailed(ssid.to_string()));
        }
        if self.failing_associations > 0 {
            self.failing_associations -= 1;
            self.link = LinkStatus::ConnectFailed;
            return Err(HardwareError::AssociationFailed(ssid.to_string()));
        }
        info!("Simulated link up on '{}'", ssid);
        self.link = LinkStatus::Connected;
        self.associated_ssid = Some(ssid.to_string());
        Ok(())
    }

    fn disassociate(&mut self) {
        self.link = LinkStatus::Disconnected;
        self.associated_ssid = None;
        self.socket = None;
    }

    fn scan(&mut self) {
        self.scans += 1;
        self.scan_pending = self.scan_completes.then_some(self.scan_delay);
    }

    fn poll_scan(&mut self) -> Option<usize> {
        match self.scan_pending? {
            0 => {
                self.scan_pending = None;
                self.last_scan = self.networks.clone();
                if !self.link.is_connected() {
                    self.link = if self.last_scan.is_empty() {
                        LinkStatus::NoSsidAvailable
                    } else {
                        LinkStatus::ScanCompleted
                    };
                }
                Some(self.last_scan.len())
            }
            busy => {
                self.scan_pending = Some(busy - 1);
                None
            }
        }
    }

    fn network_info(&self, index: usize) -> Option<NetworkInfo> {
        self.last_scan.get(index).cloned()
    }

    fn socket_connect(&mut self, host: &str, port: u16) -> Result<(), HardwareError> {
        self.connections.push((host.to_string(), port));
        let refused = || HardwareError::ConnectFailed {
            host: host.to_string(),
            port,
        };
        if !self.link.is_connected() || self.reject_connects {
            return Err(refused());
        }
        if self.failing_connects > 0 {
            self.failing_connects -= 1;
            return Err(refused());
        }
        self.socket = Some((host.to_string(), port));
        Ok(())
    }

    fn socket_disconnect(&mut self) {
        self.socket = None;
        self.inbound.clear();
    }

    fn socket_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn data_available(&self) -> bool {
        !self.inbound.is_empty()
    }

    fn read_available(&mut self) -> Vec<u8> {
        self.inbound.drain(..).collect()
    }

    fn send(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        if self.socket.is_none() {
            return Err(HardwareError::NotConnected);
        }
        self.sent.push(data.to_vec());
        self.serve(data);
        Ok(())
    }

    fn link_status(&self) -> LinkStatus {
        self.link
    }

    fn monotonic_time_ms(&self) -> u64 {
        match &self.clock {
            Clock::Manual(now) => *now,
            Clock::Wall(origin) => origin.elapsed().as_millis() as u64,
        }
    }

    fn hardware_reset(&mut self) {
        info!("Simulated hardware reset");
        self.resets += 1;
        self.link = LinkStatus::Idle;
        self.associated_ssid = None;
        self.socket = None;
        self.inbound.clear();
    }

    fn debug_write(&mut self, text: &str) {
        self.debug_lines.push(text.to_string());
    }
}
