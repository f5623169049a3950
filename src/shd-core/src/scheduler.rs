// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Cooperative task scheduler.
//!
//! Tasks are small copyable identifiers. One [`Scheduler::pass`] yields every
//! registered task once, highest priority first; the owner runs the step that
//! each identifier names. Nothing here preempts or blocks.

use std::fmt::Debug;

use tracing::debug;

/// Relative order of tasks within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Normal,
    High,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<(T, Priority)>,
    passes: u64,
}

impl<T: Copy + Eq + Debug> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Debug> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            passes: 0,
        }
    }

    /// Register `task`. Returns `false` if it is already scheduled.
    pub fn schedule(&mut self, task: T, priority: Priority) -> bool {
        if self.tasks.iter().any(|(t, _)| *t == task) {
            return false;
        }
        self.tasks.push((task, priority));
        true
    }

    pub fn unschedule(&mut self, task: T) {
        self.tasks.retain(|(t, _)| *t != task);
    }

    /// Tasks to run in this pass, high priority first, registration order
    /// within a priority.
    pub fn pass(&mut self) -> Vec<T> {
        self.passes += 1;
        let mut order: Vec<(T, Priority)> = self.tasks.clone();
        // stable sort keeps registration order among equals
        order.sort_by(|a, b| b.1.cmp(&a.1));
        order.into_iter().map(|(t, _)| t).collect()
    }

    /// Remove every task. A terminated scheduler yields empty passes.
    pub fn terminate_all(&mut self) {
        debug!("Terminating {} scheduled tasks", self.tasks.len());
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, task: T) -> bool {
        self.tasks.iter().any(|(t, _)| *t == task)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Number of passes taken so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Task {
        Poll,
        Pump,
        Tick,
        Log,
    }

    #[test]
    fn test_pass_orders_by_priority_then_registration() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Poll, Priority::Normal);
        scheduler.schedule(Task::Pump, Priority::High);
        scheduler.schedule(Task::Log, Priority::Low);
        scheduler.schedule(Task::Tick, Priority::High);

        assert_eq!(
            scheduler.pass(),
            vec![Task::Pump, Task::Tick, Task::Poll, Task::Log]
        );
        assert_eq!(scheduler.passes(), 1);
    }

    #[test]
    fn test_duplicate_schedule_is_rejected() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.schedule(Task::Poll, Priority::Normal));
        assert!(!scheduler.schedule(Task::Poll, Priority::High));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_terminate_all_empties_passes() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Task::Pump, Priority::High);
        scheduler.schedule(Task::Poll, Priority::Normal);
        scheduler.unschedule(Task::Poll);
        assert!(!scheduler.is_scheduled(Task::Poll));
        scheduler.terminate_all();
        assert!(scheduler.is_empty());
        assert!(scheduler.pass().is_empty());
    }
}
