// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod connectivity;
pub mod event;
pub mod fsm;
pub mod hardware;
pub mod parameter;
pub mod retry;
pub mod scheduler;
pub mod timer;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use connectivity::{ConnectivityEvent, ConnectivityState, EventData, HostInfo, NetworkInfo};
pub use event::dispatcher::{Delivery, EventDispatcher};
pub use event::{Event, EventError, EventId};
pub use fsm::{Action, DiagnosticSink, StateMachine, TracingSink};
pub use hardware::{Hardware, HardwareError, LinkStatus};
pub use parameter::{DeviceParameter, ParameterError, ParameterKind, ParameterList};
pub use retry::RetryCounter;
pub use scheduler::{Priority, Scheduler};
pub use timer::{TimerHandle, TimerManager, TimerService};
