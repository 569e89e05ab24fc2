//! The event bus — every clock state change is observable here.
//!
//! RULE: Observers learn about clocks ONLY through events.
//! An event is published once per field whose resulting value actually
//! changed, after the owning clock's lock has been released, so a listener
//! never sees a half-updated clock and may safely call back into it.

use crate::types::{ClockId, Millis};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// The closed set of observable clock properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockProperty {
    Name,
    Direction,
    MinimumNumber,
    MaximumNumber,
    Number,
    MinimumTime,
    MaximumTime,
    Time,
    InvertedTime,
    Running,
}

/// A property value as carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Text(Option<String>),
    Flag(bool),
    Count(i64),
    Millis(Millis),
}

/// One state transition on one clock property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub clock: ClockId,
    pub property: ClockProperty,
    pub value: PropertyValue,
    pub previous: PropertyValue,
}

/// Restricts a subscription to a specific clock and/or property.
/// An empty filter matches every event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub clock: Option<ClockId>,
    pub property: Option<ClockProperty>,
}

impl EventFilter {
    /// Matches every event from every clock.
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches every property of one clock.
    pub fn clock(id: impl Into<ClockId>) -> Self {
        Self {
            clock: Some(id.into()),
            property: None,
        }
    }

    /// Matches exactly one (clock, property) pair.
    pub fn property(id: impl Into<ClockId>, property: ClockProperty) -> Self {
        Self {
            clock: Some(id.into()),
            property: Some(property),
        }
    }

    fn matches(&self, event: &ClockEvent) -> bool {
        if let Some(clock) = &self.clock {
            if *clock != event.clock {
                return false;
            }
        }
        if let Some(property) = self.property {
            if property != event.property {
                return false;
            }
        }
        true
    }
}

type Listener = Arc<dyn Fn(&ClockEvent) + Send + Sync>;

struct Subscription {
    filter: EventFilter,
    listener: Listener,
}

/// Publish/subscribe hub with two delivery channels.
///
/// Synchronous subscribers run inside `publish`, on the mutating thread.
/// Asynchronous subscribers only see events when `drain` is called, which
/// gives tests and slow consumers a deterministic flush point.
#[derive(Default)]
pub struct EventBus {
    sync_subs: Mutex<Vec<Arc<Subscription>>>,
    async_subs: Mutex<Vec<Arc<Subscription>>>,
    pending: Mutex<VecDeque<ClockEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous listener, invoked inside the mutating call.
    pub fn subscribe<F>(&self, filter: EventFilter, listener: F)
    where
        F: Fn(&ClockEvent) + Send + Sync + 'static,
    {
        self.sync_subs.lock().unwrap().push(Arc::new(Subscription {
            filter,
            listener: Arc::new(listener),
        }));
    }

    /// Register an asynchronous listener; it receives queued events on `drain`.
    pub fn subscribe_async<F>(&self, filter: EventFilter, listener: F)
    where
        F: Fn(&ClockEvent) + Send + Sync + 'static,
    {
        self.async_subs.lock().unwrap().push(Arc::new(Subscription {
            filter,
            listener: Arc::new(listener),
        }));
    }

    /// Publish a batch of events: deliver to synchronous subscribers now and
    /// queue for asynchronous delivery. Nothing is queued while there are no
    /// asynchronous subscribers, so an undrained bus cannot grow unbounded.
    ///
    /// The subscriber list is cloned before invocation so a listener may
    /// re-enter the bus (subscribe, publish) without deadlocking.
    pub fn publish(&self, events: &[ClockEvent]) {
        if events.is_empty() {
            return;
        }
        if !self.async_subs.lock().unwrap().is_empty() {
            self.pending.lock().unwrap().extend(events.iter().cloned());
        }
        let subs: Vec<Arc<Subscription>> = self.sync_subs.lock().unwrap().clone();
        for event in events {
            for sub in &subs {
                if sub.filter.matches(event) {
                    (sub.listener)(event);
                }
            }
        }
    }

    /// Deliver all queued events to asynchronous subscribers, in publish
    /// order. Events enqueued by the listeners themselves are delivered too.
    /// Returns the number of events delivered.
    pub fn drain(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.pending.lock().unwrap().pop_front();
            let Some(event) = next else { break };
            let subs: Vec<Arc<Subscription>> = self.async_subs.lock().unwrap().clone();
            for sub in &subs {
                if sub.filter.matches(&event) {
                    (sub.listener)(&event);
                }
            }
            delivered += 1;
        }
        delivered
    }

    /// Number of events queued for asynchronous delivery.
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
