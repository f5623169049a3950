// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Tick-driven one-shot timers.
//!
//! Timers never fire on their own. The owner calls [`TimerManager::tick`]
//! with the current monotonic time once per scheduler pass, and every running
//! timer whose deadline has passed is turned into an expiry event on the
//! dispatcher.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::connectivity::EventData;
use crate::event::dispatcher::EventDispatcher;
use crate::event::EventId;

/// Opaque identifier of a timer created by a [`TimerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u16);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer{}", self.0)
    }
}

/// Timer operations the orchestrator relies on.
pub trait TimerService {
    /// Create a stopped timer that expires `duration_ms` after being started.
    fn create_timer(&mut self, duration_ms: u64) -> TimerHandle;

    /// Arm the timer. Has no effect if it is already running.
    fn start_timer(&mut self, handle: TimerHandle);

    fn stop_timer(&mut self, handle: TimerHandle);

    /// Re-arm the timer from now, whether or not it is running.
    fn restart_timer(&mut self, handle: TimerHandle);

    fn stop_all_timers(&mut self);

    fn is_active(&self, handle: TimerHandle) -> bool;
}

#[derive(Debug, Clone)]
struct Timer {
    duration_ms: u64,
    deadline_ms: Option<u64>,
}

/// Timer table advanced by explicit ticks.
#[derive(Debug)]
pub struct TimerManager {
    timers: Vec<Timer>,
    expired_event: EventId,
    now_ms: u64,
}

impl TimerManager {
    /// Create an empty manager that publishes expirations as `expired_event`.
    pub fn new(expired_event: EventId) -> Self {
        Self {
            timers: Vec::new(),
            expired_event,
            now_ms: 0,
        }
    }

    /// Clock that new deadlines are measured from.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward without expiring anything, so timers armed
    /// between ticks start from the current time. Earlier times are ignored.
    pub fn sync_clock(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Number of timers created so far.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.timers.iter().filter(|t| t.deadline_ms.is_some()).count()
    }

    /// Advance the clock and publish an expiry event for every timer whose
    /// deadline is at or before `now_ms`. Expired timers become inactive.
    pub fn tick<S>(&mut self, now_ms: u64, dispatcher: &mut EventDispatcher<S>)
    where
        S: Copy + Eq + fmt::Debug,
    {
        self.now_ms = now_ms;
        for (index, timer) in self.timers.iter_mut().enumerate() {
            let Some(deadline) = timer.deadline_ms else {
                continue;
            };
            if deadline > now_ms {
                continue;
            }
            timer.deadline_ms = None;
            let handle = TimerHandle(index as u16);
            trace!("{} expired at {} ms", handle, now_ms);
            match EventData::Timer(handle).into_event(self.expired_event) {
                Ok(event) => dispatcher.publish(event),
                Err(e) => warn!("Dropping expiry of {}: {}", handle, e),
            }
        }
    }

    fn timer_mut(&mut self, handle: TimerHandle) -> Option<&mut Timer> {
        let timer = self.timers.get_mut(usize::from(handle.0));
        if timer.is_none() {
            warn!("Unknown {}", handle);
        }
        timer
    }
}

impl TimerService for TimerManager {
    fn create_timer(&mut self, duration_ms: u64) -> TimerHandle {
        let handle = TimerHandle(self.timers.len() as u16);
        self.timers.push(Timer {
            duration_ms,
            deadline_ms: None,
        });
        handle
    }

    fn start_timer(&mut self, handle: TimerHandle) {
        let now = self.now_ms;
        if let Some(timer) = self.timer_mut(handle) {
            if timer.deadline_ms.is_none() {
                timer.deadline_ms = Some(now.saturating_add(timer.duration_ms));
            }
        }
    }

    fn stop_timer(&mut self, handle: TimerHandle) {
        if let Some(timer) = self.timer_mut(handle) {
            timer.deadline_ms = None;
        }
    }

    fn restart_timer(&mut self, handle: TimerHandle) {
        let now = self.now_ms;
        if let Some(timer) = self.timer_mut(handle) {
            timer.deadline_ms = Some(now.saturating_add(timer.duration_ms));
        }
    }

    fn stop_all_timers(&mut self) {
        for timer in &mut self.timers {
            timer.deadline_ms = None;
        }
    }

    fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers
            .get(usize::from(handle.0))
            .is_some_and(|t| t.deadline_ms.is_some())
    }
}
