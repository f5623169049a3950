// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Device orchestrator.
//!
//! [`Device`] owns the connectivity state machine and a [`DeviceCore`] that
//! holds everything the machine's actions touch: the dispatcher, timers,
//! retry counters, identity and the hardware. Keeping the two apart lets the
//! device hand the core to the machine by `&mut` while routing deliveries.

use tracing::{debug, info, warn};

use shd_core::parameter::{PARAM_STATUS, STATUS_OFFLINE};
use shd_core::{
    ConnectivityEvent, ConnectivityState, DeviceParameter, DiagnosticSink, Event, EventData,
    EventDispatcher, Hardware, LinkStatus, ParameterError, ParameterList, Priority, RetryCounter,
    Scheduler, TimerHandle, TimerManager, TimerService,
};

use crate::config::{DeviceConfig, KnownHost, KnownNetwork};
use crate::fsm::ConnectivityFsm;

/// Receivers of dispatcher deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscriber {
    /// The connectivity state machine
    Connectivity,
    /// Translates timer expirations into connectivity events
    TimerBridge,
}

/// Steps run by the cooperative scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    EventPump,
    Timers,
    Device,
}

/// State shared by the orchestrator and the state machine actions.
pub struct DeviceCore<H> {
    pub(crate) hw: H,
    pub(crate) dispatcher: EventDispatcher<Subscriber>,
    pub(crate) timers: TimerManager,
    pub(crate) scan_timer: TimerHandle,
    pub(crate) wifi_timer: TimerHandle,
    pub(crate) server_timer: TimerHandle,
    pub(crate) status_timer: TimerHandle,
    pub(crate) wifi_retries: RetryCounter,
    pub(crate) server_retries: RetryCounter,
    pub(crate) known_networks: Vec<KnownNetwork>,
    pub(crate) known_hosts: Vec<KnownHost>,
    pub(crate) parameters: ParameterList,
    pub(crate) device_id: Option<u32>,
    pub(crate) current_host: Option<String>,
    pub(crate) last_link: LinkStatus,
    pub(crate) last_socket: bool,
    /// A scan was started and its results have not been collected yet
    pub(crate) scan_pending: bool,
    /// Start of a response whose body has not fully arrived
    pub(crate) rx_pending: String,
    pub(crate) scheduler: Scheduler<Task>,
}

impl<H: Hardware> DeviceCore<H> {
    /// Queue `event` with `data`. Payloads that do not fit are logged and
    /// dropped.
    pub(crate) fn emit(&mut self, event: ConnectivityEvent, data: EventData) {
        match data.into_event(event.id()) {
            Ok(ev) => self.dispatcher.publish(ev),
            Err(e) => warn!("Dropping {}: {}", event, e),
        }
    }

    /// Stop every timer and zero both retry counters.
    pub(crate) fn go_idle(&mut self) {
        self.timers.stop_all_timers();
        self.wifi_retries.reset();
        self.server_retries.reset();
    }

    /// Stored password of a known network.
    pub(crate) fn credentials(&self, ssid: &str) -> Option<&str> {
        self.known_networks
            .iter()
            .find(|n| n.ssid == ssid)
            .map(|n| n.password.as_str())
    }

    pub(crate) fn set_status(&mut self, status: &str) {
        if let Err(e) = self.parameters.set_value(PARAM_STATUS, status) {
            warn!("Failed to update status: {}", e);
        }
    }

    fn timer_event(&self, handle: TimerHandle) -> Option<ConnectivityEvent> {
        [
            (self.scan_timer, ConnectivityEvent::NetworkScanTimeout),
            (self.wifi_timer, ConnectivityEvent::WifiConnectionTimeout),
            (self.server_timer, ConnectivityEvent::ServerConnectionTimeout),
            (self.status_timer, ConnectivityEvent::DeviceStatusRequestTimeout),
        ]
        .into_iter()
        .find(|(h, _)| *h == handle)
        .map(|(_, event)| event)
    }

    fn bridge_timer(&mut self, event: &Event) {
        let handle = match EventData::from_event(event) {
            Ok(data) => data.timer(),
            Err(e) => {
                warn!("Bad timer payload: {}", e);
                return;
            }
        };
        match handle.and_then(|h| self.timer_event(h)) {
            Some(translated) => {
                debug!("Timer expired -> {}", translated);
                self.emit(translated, EventData::None);
            }
            None => warn!("Expiry of unknown timer {:?}", handle),
        }
    }
}

/// Connectivity orchestrator for one piece of hardware.
pub struct Device<H: Hardware> {
    fsm: ConnectivityFsm<H>,
    core: DeviceCore<H>,
}

impl<H: Hardware> Device<H> {
    /// Build a device in `INITIAL` state from `config`.
    ///
    /// Fails if a configured parameter collides with another one.
    pub fn new(hw: H, config: &DeviceConfig) -> Result<Self, ParameterError> {
        let mut timers = TimerManager::new(ConnectivityEvent::TimerExpired.id());
        let scan_timer = timers.create_timer(config.wifi.scan_timeout_ms);
        let wifi_timer = timers.create_timer(config.wifi.connection_timeout_ms);
        let server_timer = timers.create_timer(config.server.connection_timeout_ms);
        let status_timer = timers.create_timer(config.status.request_interval_ms);

        let mut parameters = ParameterList::with_identity(&config.general.device_name);
        for param in &config.parameters {
            parameters.add(param.clone())?;
        }

        let mut dispatcher = EventDispatcher::new();
        for event in ConnectivityEvent::ALL {
            let subscriber = match event {
                ConnectivityEvent::TimerExpired => Subscriber::TimerBridge,
                _ => Subscriber::Connectivity,
            };
            dispatcher.subscribe(event.id(), subscriber);
        }

        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::EventPump, Priority::High);
        scheduler.schedule(Task::Timers, Priority::High);
        scheduler.schedule(Task::Device, Priority::Normal);

        let last_link = hw.link_status();
        let core = DeviceCore {
            hw,
            dispatcher,
            timers,
            scan_timer,
            wifi_timer,
            server_timer,
            status_timer,
            wifi_retries: RetryCounter::new(config.wifi.max_retries),
            server_retries: RetryCounter::new(config.server.max_retries),
            known_networks: config.wifi.networks.clone(),
            known_hosts: config.server.hosts.clone(),
            parameters,
            device_id: None,
            current_host: None,
            last_link,
            last_socket: false,
            scan_pending: false,
            rx_pending: String::new(),
            scheduler,
        };

        Ok(Self {
            fsm: ConnectivityFsm::new(),
            core,
        })
    }

    /// Replace the state machine's diagnostic sink.
    pub fn set_diagnostics(&mut self, sink: Option<Box<dyn DiagnosticSink>>) {
        self.fsm.set_diagnostics(sink);
    }

    /// Kick off the lifecycle.
    pub fn start(&mut self) {
        info!("Starting connectivity");
        self.core.emit(ConnectivityEvent::Start, EventData::None);
    }

    /// Queue an event from outside the device.
    pub fn publish(&mut self, event: ConnectivityEvent, data: EventData) {
        self.core.emit(event, data);
    }

    /// Run one scheduler pass. Returns `false` once the scheduler has been
    /// terminated.
    pub fn run_pass(&mut self) -> bool {
        for task in self.core.scheduler.pass() {
            match task {
                Task::EventPump => {
                    self.pump();
                }
                Task::Timers => self.tick_timers(),
                Task::Device => self.go(),
            }
            if self.core.scheduler.is_empty() {
                break;
            }
        }
        !self.core.scheduler.is_empty()
    }

    /// Deliver at most one queued event. Returns `false` if the queue was
    /// empty.
    pub fn pump(&mut self) -> bool {
        let Some(delivery) = self.core.dispatcher.pump() else {
            return false;
        };
        let now = self.core.hw.monotonic_time_ms();
        self.core.timers.sync_clock(now);
        for subscriber in delivery.subscribers {
            match subscriber {
                Subscriber::Connectivity => {
                    self.fsm.handle(&mut self.core, &delivery.event);
                }
                Subscriber::TimerBridge => self.core.bridge_timer(&delivery.event),
            }
        }
        true
    }

    /// Deliver queued events until the queue is empty or `limit` events were
    /// delivered. Returns the number delivered.
    pub fn pump_all(&mut self, limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.pump() {
            delivered += 1;
        }
        delivered
    }

    /// Advance timers to the hardware clock.
    pub fn tick_timers(&mut self) {
        let now = self.core.hw.monotonic_time_ms();
        self.core.timers.tick(now, &mut self.core.dispatcher);
    }

    /// Collect finished scans, and poll the session while connected.
    pub fn go(&mut self) {
        self.core.poll_scan();
        if self.state() != ConnectivityState::Connected {
            return;
        }
        let core = &mut self.core;

        let link = core.hw.link_status();
        if link != core.last_link {
            core.last_link = link;
            if !link.is_connected() {
                info!("Link lost ({})", link);
                core.emit(ConnectivityEvent::Disconnected, EventData::None);
                return;
            }
        }

        let socket = core.hw.socket_connected();
        if socket != core.last_socket {
            core.last_socket = socket;
            if !socket {
                info!("Server closed the session");
                core.emit(ConnectivityEvent::Disconnected, EventData::None);
                return;
            }
        }

        if core.hw.data_available() {
            core.emit(ConnectivityEvent::DataAvailable, EventData::None);
        }
    }

    /// Shut the session down and stop scheduling.
    pub fn terminate(&mut self) {
        info!("Terminating device");
        let core = &mut self.core;
        core.timers.stop_all_timers();
        core.hw.socket_disconnect();
        core.hw.disassociate();
        core.set_status(STATUS_OFFLINE);
        core.current_host = None;
        core.scan_pending = false;
        core.scheduler.terminate_all();
        core.dispatcher.clear();
    }

    /// Append a parameter. It is reported from the next "device online"
    /// announcement on.
    pub fn add_parameter(&mut self, parameter: DeviceParameter) -> Result<(), ParameterError> {
        self.core.parameters.add(parameter)
    }

    /// Drop every queued event.
    pub fn clear_pending(&mut self) {
        self.core.dispatcher.clear();
    }

    pub fn state(&self) -> ConnectivityState {
        self.fsm.state()
    }

    /// Scheduler has been emptied by a fatal error or termination.
    pub fn is_halted(&self) -> bool {
        self.core.scheduler.is_empty()
    }

    pub fn wifi_retries(&self) -> u32 {
        self.core.wifi_retries.attempts()
    }

    pub fn server_retries(&self) -> u32 {
        self.core.server_retries.attempts()
    }

    pub fn device_id(&self) -> Option<u32> {
        self.core.device_id
    }

    pub fn parameters(&self) -> &ParameterList {
        &self.core.parameters
    }

    /// Identity (`host:port`) of the server the session is attached to.
    pub fn current_host(&self) -> Option<&str> {
        self.core.current_host.as_deref()
    }

    pub fn pending_events(&self) -> usize {
        self.core.dispatcher.pending()
    }

    pub fn transition_count(&self) -> u64 {
        self.fsm.transition_count()
    }

    pub fn is_timer_active(&self, handle: TimerHandle) -> bool {
        self.core.timers.is_active(handle)
    }

    /// Handles of the scan, wifi, server and status timers, in that order.
    pub fn timer_handles(&self) -> [TimerHandle; 4] {
        [
            self.core.scan_timer,
            self.core.wifi_timer,
            self.core.server_timer,
            self.core.status_timer,
        ]
    }

    pub fn hardware(&self) -> &H {
        &self.core.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.core.hw
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use shd_backend::SimulatedHardware;
    use shd_core::parameter::{PARAM_DEVICE_ID, PARAM_DEVICE_NAME, STATUS_ONLINE};
    use shd_core::NetworkInfo;
    use shd_protocol::{StatusEnvelope, Version, WireMessage};

    #[derive(Clone, Default)]
    struct Trace(Rc<RefCell<Vec<String>>>);

    impl DiagnosticSink for Trace {
        fn write_line(&mut self, line: &str) {
            self.0.borrow_mut().push(line.to_string());
        }
    }

    impl Trace {
        fn count(&self, needle: &str) -> usize {
            self.0.borrow().iter().filter(|l| l.contains(needle)).count()
        }
    }

    fn net(ssid: &str, rssi: i32, is_open: bool) -> NetworkInfo {
        NetworkInfo {
            ssid: ssid.to_string(),
            channel: 6,
            rssi,
            is_open,
        }
    }

    fn config(hosts: &[(&str, u16)]) -> DeviceConfig {
        let mut config = DeviceConfig::default();
        config.general.device_name = "desk-lamp".to_string();
        config.wifi.networks = vec![KnownNetwork {
            ssid: "home".to_string(),
            password: "secret".to_string(),
        }];
        config.server.hosts = hosts
            .iter()
            .map(|(host, port)| KnownHost {
                host: host.to_string(),
                port: *port,
            })
            .collect();
        config
    }

    fn home_hw() -> SimulatedHardware {
        SimulatedHardware::new().with_networks(vec![net("home", -60, false)])
    }

    fn traced(hw: SimulatedHardware, config: &DeviceConfig) -> (Device<SimulatedHardware>, Trace) {
        let mut device = Device::new(hw, config).unwrap();
        let trace = Trace::default();
        device.set_diagnostics(Some(Box::new(trace.clone())));
        (device, trace)
    }

    fn connected(hw: SimulatedHardware) -> Device<SimulatedHardware> {
        let mut device = Device::new(hw, &config(&[("srv", 8080)])).unwrap();
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);
        device
    }

    /// Pump one event at a time until `target` is reached, then drop the rest.
    fn drive_to(device: &mut Device<SimulatedHardware>, target: ConnectivityState) {
        if target == ConnectivityState::Initial {
            return;
        }
        device.start();
        for _ in 0..20 {
            if device.state() == target {
                break;
            }
            device.pump();
        }
        assert_eq!(device.state(), target);
        device.clear_pending();
    }

    #[test]
    fn test_two_network_scan_picks_known_one() {
        let hw = SimulatedHardware::new()
            .with_networks(vec![net("cafe", -40, false), net("home", -70, false)]);
        let mut device = Device::new(hw, &config(&[("srv", 8080)])).unwrap();

        device.start();
        assert!(device.pump());
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.pending_events(), 2);

        // unknown and secured
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.pending_events(), 1);

        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        device.pump();
        assert_eq!(device.state(), ConnectivityState::ConnectingToWifi);
        assert_eq!(
            device.hardware().associations(),
            &[("home".to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn test_scan_results_delivered_strongest_first() {
        let hw = SimulatedHardware::new().with_networks(vec![
            net("a", -90, true),
            net("b", -70, true),
            net("c", -50, true),
            net("d", -30, true),
        ]);
        let mut config = config(&[("srv", 8080)]);
        config.wifi.max_retries = 10;
        let mut device = Device::new(hw, &config).unwrap();
        device.hardware_mut().reject_associations(true);

        device.start();
        device.pump_all(9);
        let order: Vec<&str> = device
            .hardware()
            .associations()
            .iter()
            .map(|(ssid, _)| ssid.as_str())
            .collect();
        assert_eq!(&order[..4], &["d", "c", "b", "a"]);
    }

    #[test]
    fn test_wifi_retries_exhaust_after_max_failures() {
        let (mut device, trace) = traced(home_hw(), &config(&[("srv", 8080)]));
        device.hardware_mut().reject_associations(true);

        device.start();
        for _ in 0..50 {
            device.pump();
            if trace.count("by event WIFI_CONNECTION_RETRIES_EXHAUSTED") > 0 {
                break;
            }
        }
        assert_eq!(trace.count("by event WIFI_CONNECTION_RETRIES_EXHAUSTED"), 1);
        assert_eq!(trace.count("by event WIFI_CONNECTION_FAILED successful"), 3);
        assert_eq!(device.hardware().associations().len(), 3);
        assert_eq!(device.wifi_retries(), 0);
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.hardware().scan_count(), 2);
    }

    #[test]
    fn test_wifi_retries_cleared_on_success() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.hardware_mut().fail_next_associations(2);
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);
        assert_eq!(device.hardware().associations().len(), 3);
        assert_eq!(device.wifi_retries(), 0);
        assert_eq!(device.hardware().associated_ssid(), Some("home"));
    }

    #[test]
    fn test_connected_session_announces_device() {
        let device = connected(home_hw());
        assert_eq!(device.current_host(), Some("srv:8080"));
        assert_eq!(device.parameters().value(PARAM_STATUS), Some(STATUS_ONLINE));
        let sent = device.hardware().sent_text();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("POST deviceOnline HTTP/1.1\r\n"));
        assert!(sent[0].contains("Host: srv:8080\r\n"));
        assert!(sent[0].contains("\"desk-lamp\""));
        let [_, _, _, status_timer] = device.timer_handles();
        assert!(device.is_timer_active(status_timer));
    }

    #[test]
    fn test_server_assigns_device_id_and_status_is_polled() {
        let mut device = connected(home_hw().with_server_device_id(42));

        device.go();
        device.pump_all(10);
        assert_eq!(device.device_id(), Some(42));
        assert_eq!(device.parameters().value(PARAM_DEVICE_ID), Some("42"));

        device.hardware_mut().advance(30_000);
        device.tick_timers();
        device.pump_all(10);
        let sent = device.hardware().sent_text();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "GET deviceStatus?id=42 HTTP/1.1\r\nHost: srv:8080\r\n\r\n");
        assert_eq!(device.state(), ConnectivityState::Connected);
    }

    #[test]
    fn test_status_timeout_without_id_sends_nothing() {
        let mut device = connected(home_hw());
        device.publish(ConnectivityEvent::DeviceStatusRequestTimeout, EventData::None);
        device.pump_all(10);
        assert_eq!(device.hardware().sent().len(), 1);
        assert_eq!(device.state(), ConnectivityState::Connected);
    }

    #[test]
    fn test_disconnect_while_connected_rescans() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.hardware_mut().fail_next_connects(1);
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);

        device.core.wifi_retries.record_failure();
        device.core.server_retries.record_failure();
        device.core.server_retries.record_failure();
        assert_eq!(device.wifi_retries(), 1);
        assert_eq!(device.server_retries(), 2);

        device.hardware_mut().drop_socket();
        device.publish(ConnectivityEvent::Disconnected, EventData::None);
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.wifi_retries(), 0);
        assert_eq!(device.server_retries(), 0);
        assert_eq!(device.current_host(), None);
        assert_eq!(device.parameters().value(PARAM_STATUS), Some(STATUS_OFFLINE));
    }

    #[test]
    fn test_link_loss_is_detected_while_connected() {
        let mut device = connected(home_hw());
        device.hardware_mut().drop_link();
        device.go();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
    }

    #[test]
    fn test_socket_close_is_detected_while_connected() {
        let mut device = connected(home_hw());
        device.hardware_mut().drop_socket();
        device.go();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
    }

    #[test]
    fn test_server_error_without_body_drops_session() {
        let mut device = connected(home_hw());
        device
            .hardware_mut()
            .push_inbound(b"HTTP/1.1 503 Service Unavailable\r\n\r\n");
        device.go();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::Connected);
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
    }

    #[test]
    fn test_rejected_device_id_drops_session() {
        let mut device = connected(home_hw());
        let body = r#"{"eventName":"deviceStatus","responseData":"unknown device"}"#;
        let response = format!(
            "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        device.hardware_mut().push_inbound(response.as_bytes());
        device.go();
        device.pump_all(3);
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.device_id(), None);
    }

    #[test]
    fn test_unparsable_device_id_is_fatal() {
        let mut device = connected(home_hw());
        let body = r#"{"eventName":"deviceOnline","responseData":"abc"}"#;
        let response = format!("HTTP/1.1 200 OK\r\n\r\n{}", body);
        device.hardware_mut().push_inbound(response.as_bytes());
        device.go();
        device.pump_all(10);
        assert_eq!(device.state(), ConnectivityState::Initial);
        assert_eq!(device.hardware().reset_count(), 1);
        assert!(device.is_halted());
    }

    #[test]
    fn test_fatal_from_every_state_resets_once() {
        for state in ConnectivityState::ALL {
            let mut device = connected_or_fresh(state);
            device.publish(
                ConnectivityEvent::FatalError,
                EventData::Error("radio fault".to_string()),
            );
            device.pump();
            assert_eq!(device.state(), ConnectivityState::Initial, "from {}", state);
            assert_eq!(device.hardware().reset_count(), 1, "from {}", state);
            assert_eq!(device.hardware().debug_lines(), &["radio fault".to_string()]);
            assert_eq!(device.pending_events(), 0);
            assert!(!device.run_pass());
        }
    }

    fn connected_or_fresh(state: ConnectivityState) -> Device<SimulatedHardware> {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        drive_to(&mut device, state);
        device
    }

    #[test]
    fn test_unmodeled_events_are_ignored() {
        let (mut device, trace) = traced(home_hw(), &config(&[("srv", 8080)]));
        device.publish(ConnectivityEvent::DataAvailable, EventData::None);
        device.publish(ConnectivityEvent::ServerConnected, EventData::None);
        device.pump_all(10);
        assert_eq!(device.state(), ConnectivityState::Initial);
        assert_eq!(device.transition_count(), 0);
        assert_eq!(
            trace.count("Transition from INITIAL by event DATA_AVAILABLE not found!"),
            1
        );
        assert!(device.hardware().sent().is_empty());
    }

    #[test]
    fn test_no_known_hosts_is_fatal() {
        let mut device = Device::new(home_hw(), &config(&[])).unwrap();
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Initial);
        assert_eq!(device.hardware().reset_count(), 1);
        assert_eq!(
            device.hardware().debug_lines(),
            &["no known hosts configured".to_string()]
        );
        assert!(!device.run_pass());
    }

    #[test]
    fn test_server_retries_exhausted_rescans() {
        let mut config = config(&[("srv", 8080)]);
        config.server.max_retries = 2;
        let (mut device, trace) = traced(home_hw(), &config);
        device.hardware_mut().reject_connects(true);

        device.start();
        for _ in 0..50 {
            device.pump();
            if trace.count("by event SERVER_CONNECTION_RETRIES_EXHAUSTED") > 0 {
                break;
            }
        }
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.hardware().connections().len(), 2);
        assert_eq!(device.server_retries(), 0);
    }

    #[test]
    fn test_fan_out_stops_after_first_connect() {
        let mut device =
            Device::new(home_hw(), &config(&[("srv-a", 8080), ("srv-b", 9090)])).unwrap();
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);
        assert_eq!(device.current_host(), Some("srv-a:8080"));
        assert_eq!(
            device.hardware().connections(),
            &[("srv-a".to_string(), 8080)]
        );
    }

    #[test]
    fn test_scan_timeout_triggers_rescan() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.hardware_mut().set_scan_completes(false);
        device.start();
        device.pump();
        assert_eq!(device.hardware().scan_count(), 1);
        let [scan_timer, ..] = device.timer_handles();
        assert!(device.is_timer_active(scan_timer));

        device.hardware_mut().advance(9_999);
        device.tick_timers();
        assert_eq!(device.pending_events(), 0);

        device.hardware_mut().advance(1);
        device.tick_timers();
        // expiry, then the bridged timeout
        device.pump();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.hardware().scan_count(), 2);
    }

    #[test]
    fn test_run_pass_drives_to_connected() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.start();
        for _ in 0..20 {
            assert!(device.run_pass());
        }
        assert_eq!(device.state(), ConnectivityState::Connected);
    }

    #[test]
    fn test_terminate_halts_and_goes_offline() {
        let mut device = connected(home_hw());
        device.terminate();
        assert!(device.is_halted());
        assert!(!device.hardware().socket_connected());
        assert_eq!(device.hardware().link_status(), LinkStatus::Disconnected);
        assert_eq!(device.parameters().value(PARAM_STATUS), Some(STATUS_OFFLINE));
        assert!(!device.run_pass());
    }

    fn status_response(device_id: u32) -> String {
        let body = StatusEnvelope::device_status(device_id).to_json().unwrap();
        WireMessage::response(Version::Http11, 200)
            .header("Content-Length", &body.len().to_string())
            .body(&body)
            .encode()
    }

    #[test]
    fn test_scan_results_arrive_on_later_passes() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.hardware_mut().set_scan_delay(3);
        device.start();

        assert!(device.run_pass());
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.pending_events(), 0);
        assert!(device.hardware().associations().is_empty());

        for _ in 0..20 {
            device.hardware_mut().advance(100);
            assert!(device.run_pass());
        }
        assert_eq!(device.state(), ConnectivityState::Connected);
        assert_eq!(device.hardware().scan_count(), 1);
    }

    #[test]
    fn test_back_to_back_responses_are_split() {
        let mut device = connected(home_hw());
        let response = status_response(42);
        device
            .hardware_mut()
            .push_inbound(format!("{}{}", response, response).as_bytes());
        device.go();
        device.pump_all(10);
        assert_eq!(device.device_id(), Some(42));
        assert_eq!(device.parameters().value(PARAM_DEVICE_ID), Some("42"));
        assert_eq!(device.state(), ConnectivityState::Connected);
    }

    #[test]
    fn test_split_response_is_reassembled() {
        let mut device = connected(home_hw());
        let response = status_response(9);
        let (head, tail) = response.split_at(response.len() - 5);

        device.hardware_mut().push_inbound(head.as_bytes());
        device.go();
        device.pump_all(10);
        assert_eq!(device.device_id(), None);

        device.hardware_mut().push_inbound(tail.as_bytes());
        device.go();
        device.pump_all(10);
        assert_eq!(device.device_id(), Some(9));
    }

    #[test]
    fn test_wifi_timeout_rescans() {
        let mut config = config(&[("srv", 8080)]);
        config.wifi.scan_timeout_ms = 60_000;
        let mut device = Device::new(home_hw(), &config).unwrap();
        device.hardware_mut().reject_associations(true);
        drive_to(&mut device, ConnectivityState::ConnectingToWifi);
        let [_, wifi_timer, _, _] = device.timer_handles();
        assert!(device.is_timer_active(wifi_timer));

        device.hardware_mut().advance(15_000);
        device.tick_timers();
        // expiry, then the bridged timeout
        device.pump();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.hardware().scan_count(), 2);
        assert!(!device.is_timer_active(wifi_timer));
    }

    #[test]
    fn test_server_timeout_rescans() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        drive_to(&mut device, ConnectivityState::ConnectingToServer);
        let [_, _, server_timer, _] = device.timer_handles();
        assert!(device.is_timer_active(server_timer));

        device.hardware_mut().advance(9_999);
        device.tick_timers();
        assert_eq!(device.pending_events(), 0);

        device.hardware_mut().advance(1);
        device.tick_timers();
        device.pump();
        device.pump();
        assert_eq!(device.state(), ConnectivityState::NetworkScanning);
        assert_eq!(device.hardware().scan_count(), 2);
    }

    #[test]
    fn test_timers_armed_between_ticks_use_current_time() {
        let mut device = Device::new(home_hw(), &config(&[("srv", 8080)])).unwrap();
        device.hardware_mut().set_scan_completes(false);
        device.hardware_mut().advance(5_000);
        device.start();
        device.pump();
        let [scan_timer, ..] = device.timer_handles();

        device.hardware_mut().advance(9_999);
        device.tick_timers();
        assert_eq!(device.pending_events(), 0);
        assert!(device.is_timer_active(scan_timer));

        device.hardware_mut().advance(1);
        device.tick_timers();
        assert_eq!(device.pending_events(), 1);
    }

    #[test]
    fn test_added_parameter_is_announced() {
        let mut device = connected(home_hw());
        device
            .add_parameter(DeviceParameter::checkbox("power", true, false))
            .unwrap();
        assert!(matches!(
            device.add_parameter(DeviceParameter::checkbox("power", false, false)),
            Err(ParameterError::Duplicate(_))
        ));

        device.publish(ConnectivityEvent::Disconnected, EventData::None);
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);

        let sent = device.hardware().sent_text();
        assert_eq!(sent.len(), 2);
        let announcement = WireMessage::parse(&sent[1]).unwrap();
        assert_eq!(announcement.header_value("host"), Some("srv:8080"));
        let envelope = StatusEnvelope::decode(announcement.body_text()).unwrap();
        let parameters = envelope.parameters.unwrap();
        assert_eq!(parameters.len(), 4);
        assert_eq!(parameters.value("power"), Some("true"));
    }

    #[test]
    fn test_server_updates_writable_parameters_only() {
        let mut config = config(&[("srv", 8080)]);
        config
            .parameters
            .push(DeviceParameter::checkbox("power", false, false));
        let mut device = Device::new(home_hw(), &config).unwrap();
        device.start();
        device.pump_all(50);
        assert_eq!(device.state(), ConnectivityState::Connected);

        let mut remote = ParameterList::with_identity("renamed");
        remote
            .add(DeviceParameter::checkbox("power", true, false))
            .unwrap();
        let mut envelope = StatusEnvelope::device_status(7);
        envelope.parameters = Some(remote);
        let body = envelope.to_json().unwrap();
        let response = WireMessage::response(Version::Http11, 200)
            .body(&body)
            .encode();
        device.hardware_mut().push_inbound(response.as_bytes());
        device.go();
        device.pump_all(10);

        assert_eq!(device.parameters().value("power"), Some("true"));
        assert_eq!(device.parameters().value(PARAM_DEVICE_NAME), Some("desk-lamp"));
        assert_eq!(device.parameters().value(PARAM_STATUS), Some(STATUS_ONLINE));
        assert_eq!(device.device_id(), Some(7));
    }
}
