// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Connectivity state machine actions.
//!
//! Each action runs synchronously inside the event pump. Actions never
//! return errors: every outcome is either a follow-up event or a log line.

use tracing::{debug, error, info, warn};

use shd_core::parameter::{PARAM_DEVICE_ID, STATUS_OFFLINE, STATUS_ONLINE};
use shd_core::{
    ConnectivityEvent, EventData, Hardware, HostInfo, NetworkInfo, ParameterList, TimerService,
};
use shd_protocol::{classify_response, StatusClass, StatusEnvelope, WireError, WireMessage};

use crate::device::DeviceCore;
use crate::session;

const NO_KNOWN_HOSTS: &str = "no known hosts configured";
const MAX_PENDING_BYTES: usize = 4096;

impl<H: Hardware> DeviceCore<H> {
    pub(crate) fn start_scan(&mut self, _data: &EventData) {
        self.go_idle();
        self.set_status(STATUS_OFFLINE);
        // a still-open socket is reused by start_server_connection
        if !self.hw.socket_connected() {
            self.current_host = None;
        }
        self.timers.start_timer(self.scan_timer);

        self.hw.scan();
        self.scan_pending = true;
        self.poll_scan();
    }

    /// Publish the results of a finished scan, strongest network first.
    pub(crate) fn poll_scan(&mut self) {
        if !self.scan_pending {
            return;
        }
        let Some(count) = self.hw.poll_scan() else {
            return;
        };
        self.scan_pending = false;

        let mut networks: Vec<NetworkInfo> =
            (0..count).filter_map(|i| self.hw.network_info(i)).collect();
        if networks.is_empty() {
            debug!("Scan found no networks");
            self.emit(ConnectivityEvent::NetworkScanFailed, EventData::None);
            return;
        }

        // strongest first, discovery order among equals
        networks.sort_by(|a, b| b.rssi.cmp(&a.rssi));
        debug!("Scan found {} networks", networks.len());
        for network in networks {
            self.emit(
                ConnectivityEvent::NetworkScanResultsReady,
                EventData::Network(network),
            );
        }
    }

    pub(crate) fn try_pick_network(&mut self, data: &EventData) {
        let Some(network) = data.network() else {
            warn!("Scan result without network descriptor");
            return;
        };
        if network.is_open || self.credentials(&network.ssid).is_some() {
            info!("Picked network '{}' ({} dBm)", network.ssid, network.rssi);
            self.emit(
                ConnectivityEvent::NetworkPicked,
                EventData::Network(network.clone()),
            );
        } else {
            debug!("Skipping unknown network '{}'", network.ssid);
        }
    }

    pub(crate) fn connect_to_network(&mut self, data: &EventData) {
        let Some(network) = data.network() else {
            warn!("Wifi connect without network descriptor");
            return;
        };

        if self.hw.link_status().is_connected() {
            self.wifi_connected();
            return;
        }

        if !self.wifi_retries.can_retry() {
            warn!(
                "Giving up on '{}' after {} attempts",
                network.ssid,
                self.wifi_retries.attempts()
            );
            self.wifi_retries.reset();
            self.timers.stop_all_timers();
            self.emit(ConnectivityEvent::WifiConnectionRetriesExhausted, EventData::None);
            return;
        }

        self.timers.restart_timer(self.wifi_timer);
        let password = self
            .credentials(&network.ssid)
            .map(str::to_string)
            .unwrap_or_default();
        match self.hw.associate(&network.ssid, &password) {
            Ok(()) => {
                info!("Associated with '{}'", network.ssid);
                self.wifi_connected();
            }
            Err(e) => {
                self.wifi_retries.record_failure();
                warn!(
                    "{} (attempt {}/{})",
                    e,
                    self.wifi_retries.attempts(),
                    self.wifi_retries.max_attempts()
                );
                self.emit(
                    ConnectivityEvent::WifiConnectionFailed,
                    EventData::Network(network.clone()),
                );
            }
        }
    }

    fn wifi_connected(&mut self) {
        self.wifi_retries.reset();
        self.timers.stop_timer(self.scan_timer);
        self.timers.stop_timer(self.wifi_timer);
        self.emit(ConnectivityEvent::WifiConnected, EventData::None);
    }

    pub(crate) fn start_server_connection(&mut self, _data: &EventData) {
        if !self.hw.link_status().is_connected() {
            self.emit(ConnectivityEvent::Disconnected, EventData::None);
            return;
        }
        if self.hw.socket_connected() {
            self.emit(ConnectivityEvent::ServerConnected, EventData::None);
            return;
        }
        if self.known_hosts.is_empty() {
            self.emit(
                ConnectivityEvent::FatalError,
                EventData::Error(NO_KNOWN_HOSTS.to_string()),
            );
            return;
        }

        self.go_idle();
        self.timers.start_timer(self.server_timer);
        for host in self.known_hosts.clone() {
            self.emit(
                ConnectivityEvent::ServerPicked,
                EventData::Host(HostInfo {
                    host: host.host,
                    port: host.port,
                }),
            );
        }
    }

    pub(crate) fn connect_to_server(&mut self, data: &EventData) {
        let Some(host) = data.host() else {
            warn!("Server connect without host descriptor");
            return;
        };

        // A fan-out sibling already attached the session.
        if self.hw.socket_connected() {
            debug!("Already connected, skipping {}", host);
            return;
        }

        if !self.server_retries.can_retry() {
            warn!("Giving up on servers after {} attempts", self.server_retries.attempts());
            self.emit(ConnectivityEvent::ServerConnectionRetriesExhausted, EventData::None);
            return;
        }

        match self.hw.socket_connect(&host.host, host.port) {
            Ok(()) => {
                info!("Connected to {}", host);
                self.current_host = Some(host.to_string());
                self.emit(ConnectivityEvent::ServerConnected, EventData::None);
            }
            Err(e) => {
                self.server_retries.record_failure();
                warn!(
                    "{} (attempt {}/{})",
                    e,
                    self.server_retries.attempts(),
                    self.server_retries.max_attempts()
                );
                self.emit(
                    ConnectivityEvent::ServerConnectionFailed,
                    EventData::Host(host.clone()),
                );
            }
        }
    }

    pub(crate) fn enter_connected(&mut self, _data: &EventData) {
        self.go_idle();
        self.rx_pending.clear();
        self.last_link = self.hw.link_status();
        self.last_socket = self.hw.socket_connected();
        self.set_status(STATUS_ONLINE);

        match session::device_online_request(self.current_host.as_deref(), &self.parameters) {
            Ok(request) => self.send_request(&request),
            Err(e) => warn!("Failed to encode device online envelope: {}", e),
        }
        self.timers.start_timer(self.status_timer);
    }

    pub(crate) fn request_device_status(&mut self, _data: &EventData) {
        if let Some(id) = self.device_id {
            let request = session::device_status_request(self.current_host.as_deref(), id);
            self.send_request(&request);
        }
        self.timers.restart_timer(self.status_timer);
    }

    pub(crate) fn read_data(&mut self, _data: &EventData) {
        if !self.hw.data_available() {
            return;
        }
        let bytes = self.hw.read_available();
        let mut text = std::mem::take(&mut self.rx_pending);
        text.push_str(&String::from_utf8_lossy(&bytes));

        let mut rest = text.as_str();
        while !rest.is_empty() {
            match WireMessage::parse_prefix(rest) {
                Ok((message, used)) => {
                    self.handle_response(&message);
                    rest = &rest[used..];
                }
                Err(WireError::Incomplete { .. }) if rest.len() <= MAX_PENDING_BYTES => {
                    self.rx_pending = rest.to_string();
                    break;
                }
                Err(e) => {
                    debug!("Discarding inbound data: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_response(&mut self, message: &WireMessage) {
        if message.body_text().is_empty() {
            match message.status_class() {
                Some(StatusClass::ServerError) => {
                    warn!("Server error {:?}, dropping session", message.status());
                    self.emit(ConnectivityEvent::Disconnected, EventData::None);
                }
                _ => info!("Server replied {:?} without body", message.status()),
            }
            return;
        }

        let envelope = match StatusEnvelope::decode(message.body_text()) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Discarding malformed envelope: {}", e);
                return;
            }
        };
        let class = message.status_class();
        if class == Some(StatusClass::Success) {
            if let Some(parameters) = &envelope.parameters {
                self.apply_remote_parameters(parameters);
            }
        }
        match class.and_then(|class| classify_response(class, &envelope.event_name)) {
            Some(event) => self.emit(event, EventData::Response(envelope.response_text())),
            None => debug!(
                "Ignoring '{}' with status {:?}",
                envelope.event_name,
                message.status()
            ),
        }
    }

    /// Take over values the server set. Unknown and read-only entries are
    /// refused one by one.
    fn apply_remote_parameters(&mut self, parameters: &ParameterList) {
        for param in parameters.iter() {
            match self
                .parameters
                .update_from_remote(&param.name, &param.current_value)
            {
                Ok(()) => debug!("Parameter '{}' = '{}'", param.name, param.current_value),
                Err(e) => warn!("Refusing remote update: {}", e),
            }
        }
    }

    pub(crate) fn save_device_id(&mut self, data: &EventData) {
        let text = data.text().unwrap_or_default();
        match session::parse_device_id(text) {
            Some(id) => {
                if self.device_id != Some(id) {
                    info!("Device id assigned: {}", id);
                }
                self.device_id = Some(id);
                if let Err(e) = self.parameters.set_value(PARAM_DEVICE_ID, &id.to_string()) {
                    warn!("Failed to store device id: {}", e);
                }
            }
            None => self.emit(
                ConnectivityEvent::FatalError,
                EventData::Error(format!("unparsable device id '{}'", text)),
            ),
        }
    }

    pub(crate) fn handle_device_id_error(&mut self, data: &EventData) {
        warn!("Server rejected the device: {}", data.text().unwrap_or_default());
        self.emit(ConnectivityEvent::Disconnected, EventData::None);
    }

    pub(crate) fn handle_fatal(&mut self, data: &EventData) {
        let text = data.text().unwrap_or("fatal error");
        error!("Fatal: {}", text);
        self.hw.debug_write(text);
        self.timers.stop_all_timers();
        self.scheduler.terminate_all();
        self.dispatcher.clear();
        self.scan_pending = false;
        self.rx_pending.clear();
        self.hw.hardware_reset();
    }

    fn send_request(&mut self, request: &WireMessage) {
        if !request.is_valid() || !self.hw.socket_connected() {
            warn!("Not sending request, session is down");
            return;
        }
        if let Err(e) = self.hw.send(request.encode().as_bytes()) {
            warn!("Send failed: {}", e);
        }
    }
}
