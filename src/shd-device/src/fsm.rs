// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Connectivity transition table.

use tracing::warn;

use shd_core::{
    Action, ConnectivityEvent, ConnectivityState, DiagnosticSink, Event, EventData, Hardware,
    StateMachine, TracingSink,
};

use crate::device::DeviceCore;

type Machine<H> = StateMachine<ConnectivityState, ConnectivityEvent, DeviceCore<H>, EventData>;
type Row<H> = (
    ConnectivityState,
    ConnectivityEvent,
    ConnectivityState,
    Action<DeviceCore<H>, EventData>,
);

/// All table rows except the per-state fatal error rows.
#[rustfmt::skip]
fn rows<H: Hardware>() -> Vec<Row<H>> {
    use ConnectivityEvent as E;
    use ConnectivityState as S;

    let start_scan: Action<DeviceCore<H>, EventData> = DeviceCore::start_scan;
    let try_pick: Action<DeviceCore<H>, EventData> = DeviceCore::try_pick_network;
    let connect_wifi: Action<DeviceCore<H>, EventData> = DeviceCore::connect_to_network;
    let start_server: Action<DeviceCore<H>, EventData> = DeviceCore::start_server_connection;
    let connect_server: Action<DeviceCore<H>, EventData> = DeviceCore::connect_to_server;
    let enter_connected: Action<DeviceCore<H>, EventData> = DeviceCore::enter_connected;
    let request_status: Action<DeviceCore<H>, EventData> = DeviceCore::request_device_status;
    let read_data: Action<DeviceCore<H>, EventData> = DeviceCore::read_data;
    let save_id: Action<DeviceCore<H>, EventData> = DeviceCore::save_device_id;
    let id_error: Action<DeviceCore<H>, EventData> = DeviceCore::handle_device_id_error;

    vec![
        (S::Initial, E::Start, S::NetworkScanning, start_scan),
        // scanning
        (S::NetworkScanning, E::NetworkScanResultsReady, S::NetworkScanning, try_pick),
        (S::NetworkScanning, E::NetworkScanFailed, S::NetworkScanning, start_scan),
        (S::NetworkScanning, E::NetworkScanTimeout, S::NetworkScanning, start_scan),
        (S::NetworkScanning, E::NetworkPicked, S::ConnectingToWifi, connect_wifi),
        (S::NetworkScanning, E::WifiConnected, S::ConnectingToServer, start_server),
        // associating
        (S::ConnectingToWifi, E::WifiConnected, S::ConnectingToServer, start_server),
        (S::ConnectingToWifi, E::NetworkScanResultsReady, S::ConnectingToWifi, try_pick),
        (S::ConnectingToWifi, E::NetworkPicked, S::ConnectingToWifi, connect_wifi),
        (S::ConnectingToWifi, E::WifiConnectionFailed, S::ConnectingToWifi, connect_wifi),
        (S::ConnectingToWifi, E::WifiConnectionTimeout, S::NetworkScanning, start_scan),
        (S::ConnectingToWifi, E::WifiConnectionRetriesExhausted, S::NetworkScanning, start_scan),
        (S::ConnectingToWifi, E::Disconnected, S::NetworkScanning, start_scan),
        // attaching
        (S::ConnectingToServer, E::ServerPicked, S::ConnectingToServer, connect_server),
        (S::ConnectingToServer, E::ServerConnectionFailed, S::ConnectingToServer, connect_server),
        (S::ConnectingToServer, E::ServerConnected, S::Connected, enter_connected),
        (S::ConnectingToServer, E::ServerConnectionRetriesExhausted, S::NetworkScanning, start_scan),
        (S::ConnectingToServer, E::ServerConnectionTimeout, S::NetworkScanning, start_scan),
        (S::ConnectingToServer, E::Disconnected, S::NetworkScanning, start_scan),
        // session
        (S::Connected, E::DeviceStatusRequestTimeout, S::Connected, request_status),
        (S::Connected, E::DataAvailable, S::Connected, read_data),
        (S::Connected, E::DeviceIdReceived, S::Connected, save_id),
        (S::Connected, E::DeviceIdError, S::Connected, id_error),
        (S::Connected, E::Disconnected, S::NetworkScanning, start_scan),
    ]
}

/// The connectivity state machine bound to a device core.
pub struct ConnectivityFsm<H> {
    machine: Machine<H>,
}

impl<H: Hardware> Default for ConnectivityFsm<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hardware> ConnectivityFsm<H> {
    /// Build the full table in `INITIAL` state, tracing through `tracing`.
    pub fn new() -> Self {
        let mut machine =
            StateMachine::new(ConnectivityState::Initial).with_diagnostics(Box::new(TracingSink));
        for (state, event, next, action) in rows::<H>() {
            machine.add_transition(state, event, next, Some(action));
        }
        let handle_fatal: Action<DeviceCore<H>, EventData> = DeviceCore::handle_fatal;
        for state in ConnectivityState::ALL {
            machine.add_transition(
                state,
                ConnectivityEvent::FatalError,
                ConnectivityState::Initial,
                Some(handle_fatal),
            );
        }
        Self { machine }
    }

    pub fn set_diagnostics(&mut self, sink: Option<Box<dyn DiagnosticSink>>) {
        self.machine.set_diagnostics(sink);
    }

    /// Unpack a dispatcher event and run it through the table.
    /// Returns `true` if a transition was taken.
    pub fn handle(&mut self, core: &mut DeviceCore<H>, event: &Event) -> bool {
        let kind = match ConnectivityEvent::try_from(event.id()) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };
        let data = match EventData::from_event(event) {
            Ok(data) => data,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };
        self.machine.execute(core, kind, &data)
    }

    pub fn state(&self) -> ConnectivityState {
        self.machine.state()
    }

    pub fn transition_count(&self) -> u64 {
        self.machine.transition_count()
    }

    pub fn has_transition(&self, state: ConnectivityState, event: ConnectivityEvent) -> bool {
        self.machine.has_transition(state, event)
    }

    pub fn table_len(&self) -> usize {
        self.machine.table_len()
    }
}
