// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Publish/subscribe dispatcher with an ordered delivery queue.
//!
//! Subscribers are identified by a small copyable key chosen by the owner
//! (usually an enum naming the owner's components). Publishing only queues
//! the event; [`EventDispatcher::pump`] pops one event per call and returns
//! it together with the subscribers registered for its identifier at that
//! moment. The owner routes the delivery to its components, which is why a
//! subscriber removed while a delivery is being routed still receives it.

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;

use tracing::trace;

use super::{Event, EventId};

/// One popped event and the subscribers it must be delivered to, in
/// registration order.
#[derive(Debug, Clone)]
pub struct Delivery<S> {
    pub event: Event,
    pub subscribers: Vec<S>,
}

/// Owns subscriptions and the pending event queue.
pub struct EventDispatcher<S> {
    subscriptions: HashMap<EventId, Vec<S>>,
    queue: VecDeque<Event>,
}

impl<S: Copy + Eq + Debug> Default for EventDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Copy + Eq + Debug> EventDispatcher<S> {
    /// Create a dispatcher with no subscriptions and an empty queue.
    pub fn new() -> Self {
        Self {
            subscriptions: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Register `subscriber` for events with identifier `id`.
    /// Registering the same subscriber twice has no effect.
    pub fn subscribe(&mut self, id: EventId, subscriber: S) {
        let list = self.subscriptions.entry(id).or_default();
        if !list.contains(&subscriber) {
            list.push(subscriber);
        }
    }

    /// Remove `subscriber` from the list for `id`, if present.
    pub fn unsubscribe(&mut self, id: EventId, subscriber: S) {
        if let Some(list) = self.subscriptions.get_mut(&id) {
            list.retain(|s| *s != subscriber);
        }
    }

    /// Get the number of subscribers registered for `id`.
    pub fn subscriber_count(&self, id: EventId) -> usize {
        self.subscriptions.get(&id).map_or(0, Vec::len)
    }

    /// Append an event to the tail of the queue.
    pub fn publish(&mut self, event: Event) {
        trace!("queued event {} ({} bytes)", event.id(), event.len());
        self.queue.push_back(event);
    }

    /// Number of events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest event and snapshot its subscriber list.
    ///
    /// Returns `None` when the queue is empty. An event nobody subscribes to
    /// is still consumed and comes back with an empty subscriber list.
    pub fn pump(&mut self) -> Option<Delivery<S>> {
        let event = self.queue.pop_front()?;
        let subscribers = self
            .subscriptions
            .get(&event.id())
            .cloned()
            .unwrap_or_default();
        if subscribers.is_empty() {
            trace!("event {} has no subscribers", event.id());
        }
        Some(Delivery { event, subscribers })
    }

    /// Drop every pending event. Subscriptions are kept.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
