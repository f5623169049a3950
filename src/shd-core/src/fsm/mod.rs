// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Table-driven state machine engine.
//!
//! The engine maps `(state, event)` pairs to a next state and an optional
//! action. Actions are plain function pointers that receive a caller-owned
//! context and the event data, so the machine never captures the state it
//! operates on. A pair missing from the table is not an error: the event is
//! reported to the diagnostic sink and ignored.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use tracing::debug;

/// Transition action invoked with the owner's context and the event data.
pub type Action<C, D> = fn(&mut C, &D);

/// Sink for human-readable trace lines emitted by the engine.
pub trait DiagnosticSink {
    fn write_line(&mut self, line: &str);
}

/// Diagnostic sink that forwards lines to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_line(&mut self, line: &str) {
        debug!("{}", line);
    }
}

struct Transition<S, C, D> {
    next: S,
    action: Option<Action<C, D>>,
}

/// Generic transition-table executor.
pub struct StateMachine<S, E, C, D> {
    state: S,
    transitions: HashMap<(S, E), Transition<S, C, D>>,
    diagnostics: Option<Box<dyn DiagnosticSink>>,
    transition_count: u64,
}

impl<S, E, C, D> StateMachine<S, E, C, D>
where
    S: Copy + Eq + Hash + Display,
    E: Copy + Eq + Hash + Display,
{
    /// Create a machine in `initial` state with an empty table.
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            transitions: HashMap::new(),
            diagnostics: None,
            transition_count: 0,
        }
    }

    /// Attach a diagnostic sink.
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    pub fn set_diagnostics(&mut self, sink: Option<Box<dyn DiagnosticSink>>) {
        self.diagnostics = sink;
    }

    /// Insert or overwrite the entry for `(state, event)`.
    pub fn add_transition(&mut self, state: S, event: E, next: S, action: Option<Action<C, D>>) {
        self.transitions
            .insert((state, event), Transition { next, action });
    }

    /// Get the current state.
    pub fn state(&self) -> S {
        self.state
    }

    /// Number of transitions taken since construction.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    pub fn has_transition(&self, state: S, event: E) -> bool {
        self.transitions.contains_key(&(state, event))
    }

    /// Number of entries in the transition table.
    pub fn table_len(&self) -> usize {
        self.transitions.len()
    }

    /// Process `event` in the current state.
    ///
    /// Runs the action (if any) before the state changes, so the action
    /// observes the old state through its context. Returns `true` if the
    /// pair was found in the table.
    pub fn execute(&mut self, ctx: &mut C, event: E, data: &D) -> bool {
        if self.transitions.is_empty() {
            self.trace("Transitions table is empty!".to_string());
            return false;
        }

        let Some(transition) = self.transitions.get(&(self.state, event)) else {
            let line = format!("Transition from {} by event {} not found!", self.state, event);
            self.trace(line);
            return false;
        };

        let next = transition.next;
        if let Some(action) = transition.action {
            action(ctx, data);
        }

        let line = format!(
            "Transition from {} to {} by event {} successful!",
            self.state, next, event
        );
        self.trace(line);

        self.state = next;
        self.transition_count += 1;
        true
    }

    fn trace(&mut self, line: String) {
        if let Some(sink) = self.diagnostics.as_mut() {
            sink.write_line(&line);
        }
    }
}
