//! The clock model — a named counter with a bounded number axis and a
//! bounded time axis.
//!
//! CONSTRAINT RULES (hold after every public mutation, never visible
//! half-applied):
//!   - minimumNumber <= number <= maximumNumber
//!   - minimumTime   <= time   <= maximumTime
//!   - Raising a minimum drags the maximum (and the value) up with it.
//!   - Lowering a maximum below the minimum is clamped up to the minimum.
//!   - Direct value writes are clamped into range, never rejected.

use crate::event::{ClockEvent, ClockProperty, EventBus, PropertyValue};
use crate::rules::{self, RuleValue};
use crate::snapshot::ClockSnapshot;
use crate::types::{ClockId, Millis};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// The full attribute set of a clock. The methods on this type are the
/// constraint engine: each one re-derives a consistent state from a proposed
/// change and touches nothing outside the struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ClockState {
    pub name: Option<String>,
    pub number: i64,
    pub minimum_number: i64,
    pub maximum_number: i64,
    pub time: Millis,
    pub minimum_time: Millis,
    pub maximum_time: Millis,
    pub count_direction_down: bool,
    pub running: bool,
}

impl Default for ClockState {
    fn default() -> Self {
        Self {
            name: None,
            number: 0,
            minimum_number: 0,
            maximum_number: 0,
            time: 0,
            minimum_time: 0,
            maximum_time: 0,
            count_direction_down: false,
            running: false,
        }
    }
}

impl ClockState {
    fn clamp_number(&self, number: i64) -> i64 {
        number.clamp(self.minimum_number, self.maximum_number)
    }

    fn clamp_time(&self, time: Millis) -> Millis {
        time.clamp(self.minimum_time, self.maximum_time)
    }

    fn set_number(&mut self, number: i64) {
        self.number = self.clamp_number(number);
    }

    fn set_minimum_number(&mut self, minimum: i64) {
        self.minimum_number = minimum;
        if self.maximum_number < minimum {
            self.maximum_number = minimum;
        }
        self.number = self.clamp_number(self.number);
    }

    fn set_maximum_number(&mut self, maximum: i64) {
        // A maximum below the current minimum is clamped up, not applied.
        self.maximum_number = maximum.max(self.minimum_number);
        self.number = self.clamp_number(self.number);
    }

    fn set_time(&mut self, time: Millis) {
        self.time = self.clamp_time(time);
    }

    fn set_minimum_time(&mut self, minimum: Millis) {
        self.minimum_time = minimum;
        if self.maximum_time < minimum {
            self.maximum_time = minimum;
        }
        self.time = self.clamp_time(self.time);
    }

    fn set_maximum_time(&mut self, maximum: Millis) {
        self.maximum_time = maximum.max(self.minimum_time);
        self.time = self.clamp_time(self.time);
    }

    fn elapse(&mut self, delta: Millis) {
        // Saturate on overflow so an extreme delta still lands in range.
        let proposed = if self.count_direction_down {
            self.time.saturating_sub(delta)
        } else {
            self.time.saturating_add(delta)
        };
        self.time = self.clamp_time(proposed);
    }

    /// The time value representing "start" for the current direction.
    fn start_value(&self) -> Millis {
        if self.count_direction_down {
            self.maximum_time
        } else {
            self.minimum_time
        }
    }

    fn end_value(&self) -> Millis {
        if self.count_direction_down {
            self.minimum_time
        } else {
            self.maximum_time
        }
    }

    fn time_elapsed(&self) -> Millis {
        if self.count_direction_down {
            self.maximum_time - self.time
        } else {
            self.time - self.minimum_time
        }
    }

    fn time_remaining(&self) -> Millis {
        if self.count_direction_down {
            self.time - self.minimum_time
        } else {
            self.maximum_time - self.time
        }
    }

    /// The stored time as seen from the opposite counting direction.
    fn inverted_time(&self) -> Millis {
        self.maximum_time + self.minimum_time - self.time
    }
}

/// Diff two states into change events, in cascade order: minimum, then
/// maximum, then value. A time change also re-derives InvertedTime.
fn diff_events(id: &str, before: &ClockState, after: &ClockState) -> Vec<ClockEvent> {
    let mut events = Vec::new();
    let mut push = |property, previous, value| {
        if previous != value {
            events.push(ClockEvent {
                clock: id.to_string(),
                property,
                value,
                previous,
            });
        }
    };

    push(
        ClockProperty::Name,
        PropertyValue::Text(before.name.clone()),
        PropertyValue::Text(after.name.clone()),
    );
    push(
        ClockProperty::Direction,
        PropertyValue::Flag(before.count_direction_down),
        PropertyValue::Flag(after.count_direction_down),
    );
    push(
        ClockProperty::MinimumNumber,
        PropertyValue::Count(before.minimum_number),
        PropertyValue::Count(after.minimum_number),
    );
    push(
        ClockProperty::MaximumNumber,
        PropertyValue::Count(before.maximum_number),
        PropertyValue::Count(after.maximum_number),
    );
    push(
        ClockProperty::Number,
        PropertyValue::Count(before.number),
        PropertyValue::Count(after.number),
    );
    push(
        ClockProperty::MinimumTime,
        PropertyValue::Millis(before.minimum_time),
        PropertyValue::Millis(after.minimum_time),
    );
    push(
        ClockProperty::MaximumTime,
        PropertyValue::Millis(before.maximum_time),
        PropertyValue::Millis(after.maximum_time),
    );
    push(
        ClockProperty::Time,
        PropertyValue::Millis(before.time),
        PropertyValue::Millis(after.time),
    );
    push(
        ClockProperty::InvertedTime,
        PropertyValue::Millis(before.inverted_time()),
        PropertyValue::Millis(after.inverted_time()),
    );
    push(
        ClockProperty::Running,
        PropertyValue::Flag(before.running),
        PropertyValue::Flag(after.running),
    );
    events
}

/// One independently configured clock, owned by a scoreboard session.
///
/// Identity (id) and the master designation are fixed at construction.
/// All mutation is serialized through one mutex; change events are published
/// after the lock is released.
pub struct Clock {
    id: ClockId,
    master: bool,
    state: Mutex<ClockState>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("id", &self.id)
            .field("master", &self.master)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Clock {
    pub(crate) fn new(id: impl Into<ClockId>, master: bool, bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            master,
            state: Mutex::new(ClockState::default()),
            bus,
        })
    }

    /// Apply a mutation under the state lock, then publish the resulting
    /// change events with the lock released.
    fn mutate(&self, apply: impl FnOnce(&mut ClockState)) {
        let events = {
            let mut state = self.state.lock().unwrap();
            let before = state.clone();
            apply(&mut state);
            diff_events(&self.id, &before, &state)
        };
        self.bus.publish(&events);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_master_clock(&self) -> bool {
        self.master
    }

    pub fn name(&self) -> Option<String> {
        self.state.lock().unwrap().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.mutate(|s| s.name = Some(name.to_string()));
    }

    // ── Number axis ────────────────────────────────────────────────

    pub fn number(&self) -> i64 {
        self.state.lock().unwrap().number
    }

    pub fn minimum_number(&self) -> i64 {
        self.state.lock().unwrap().minimum_number
    }

    pub fn maximum_number(&self) -> i64 {
        self.state.lock().unwrap().maximum_number
    }

    pub fn set_number(&self, number: i64) {
        self.mutate(|s| s.set_number(number));
    }

    pub fn change_number(&self, delta: i64) {
        self.mutate(|s| s.set_number(s.number.saturating_add(delta)));
    }

    pub fn set_minimum_number(&self, minimum: i64) {
        self.mutate(|s| s.set_minimum_number(minimum));
    }

    pub fn change_minimum_number(&self, delta: i64) {
        self.mutate(|s| s.set_minimum_number(s.minimum_number.saturating_add(delta)));
    }

    pub fn set_maximum_number(&self, maximum: i64) {
        self.mutate(|s| s.set_maximum_number(maximum));
    }

    pub fn change_maximum_number(&self, delta: i64) {
        self.mutate(|s| s.set_maximum_number(s.maximum_number.saturating_add(delta)));
    }

    // ── Time axis ──────────────────────────────────────────────────

    pub fn time(&self) -> Millis {
        self.state.lock().unwrap().time
    }

    pub fn minimum_time(&self) -> Millis {
        self.state.lock().unwrap().minimum_time
    }

    pub fn maximum_time(&self) -> Millis {
        self.state.lock().unwrap().maximum_time
    }

    pub fn set_time(&self, time: Millis) {
        self.mutate(|s| s.set_time(time));
    }

    pub fn change_time(&self, delta: Millis) {
        self.mutate(|s| s.set_time(s.time.saturating_add(delta)));
    }

    pub fn set_minimum_time(&self, minimum: Millis) {
        self.mutate(|s| s.set_minimum_time(minimum));
    }

    pub fn change_minimum_time(&self, delta: Millis) {
        self.mutate(|s| s.set_minimum_time(s.minimum_time.saturating_add(delta)));
    }

    pub fn set_maximum_time(&self, maximum: Millis) {
        self.mutate(|s| s.set_maximum_time(maximum));
    }

    pub fn change_maximum_time(&self, delta: Millis) {
        self.mutate(|s| s.set_maximum_time(s.maximum_time.saturating_add(delta)));
    }

    /// Set the time back to the start bound implied by the current direction.
    pub fn reset_time(&self) {
        self.mutate(|s| s.time = s.start_value());
    }

    /// Advance the clock by elapsed real time: forward when counting up,
    /// backward when counting down, clamped into range. This is the ticker's
    /// sole entry point.
    pub fn elapse_time(&self, delta: Millis) {
        self.mutate(|s| s.elapse(delta));
    }

    // ── Direction and running state ────────────────────────────────

    pub fn is_count_direction_down(&self) -> bool {
        self.state.lock().unwrap().count_direction_down
    }

    /// Flip the meaning of elapsed vs. remaining. The stored time is left
    /// untouched; setting the current value emits nothing.
    pub fn set_count_direction_down(&self, down: bool) {
        self.mutate(|s| s.count_direction_down = down);
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    /// Start the clock. Starting a running clock is a no-op.
    pub fn start(&self) {
        self.mutate(|s| s.running = true);
    }

    /// Stop the clock. Stopping a stopped clock is a no-op.
    pub fn stop(&self) {
        self.mutate(|s| s.running = false);
    }

    /// Advance to the next period/jam: increment the number (clamped) and
    /// reset the time to the start bound. Does not change the running state.
    pub fn start_next(&self) {
        self.mutate(|s| {
            s.set_number(s.number + 1);
            s.time = s.start_value();
        });
    }

    /// Return the clock to construction defaults for direction, number, time
    /// and running state. The configured bounds are kept.
    pub fn reset(&self) {
        self.mutate(|s| {
            s.count_direction_down = false;
            s.running = false;
            s.number = s.minimum_number;
            s.time = s.start_value();
        });
    }

    // ── Derived queries ────────────────────────────────────────────

    pub fn time_elapsed(&self) -> Millis {
        self.state.lock().unwrap().time_elapsed()
    }

    pub fn time_remaining(&self) -> Millis {
        self.state.lock().unwrap().time_remaining()
    }

    pub fn inverted_time(&self) -> Millis {
        self.state.lock().unwrap().inverted_time()
    }

    pub fn is_time_at_start(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.time == state.start_value()
    }

    pub fn is_time_at_end(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.time == state.end_value()
    }

    // ── Snapshot / restore ─────────────────────────────────────────

    /// Capture the full attribute set. The snapshot is a detached value and
    /// never references the live clock.
    pub fn snapshot(&self) -> ClockSnapshot {
        ClockSnapshot::from_state(&self.id, &self.state.lock().unwrap())
    }

    /// Replay a snapshot taken from this clock. A snapshot whose id does not
    /// match is silently ignored; otherwise every attribute is overwritten
    /// atomically and each changed field emits its event.
    pub fn restore_snapshot(&self, snapshot: &ClockSnapshot) {
        if snapshot.id != self.id {
            log::debug!(
                "Ignoring snapshot for clock '{}' on clock '{}'",
                snapshot.id,
                self.id
            );
            return;
        }
        self.mutate(|s| *s = snapshot.to_state());
    }

    // ── Ruleset collaborator ───────────────────────────────────────

    /// Apply a rule pushed by the ruleset collaborator. Keys have the shape
    /// `Clock.<id>.<RuleName>`; a mismatched id or unrecognized rule name is
    /// a silent no-op.
    pub fn apply_rule(&self, key: &str, value: RuleValue) {
        let Some(rule) = rules::rule_for(key, &self.id) else {
            return;
        };
        match (rule, value) {
            ("Name", RuleValue::Text(name)) => self.set_name(&name),
            ("Direction", RuleValue::Flag(down)) => self.set_count_direction_down(down),
            ("MinimumNumber", RuleValue::Integer(n)) => self.set_minimum_number(n),
            ("MaximumNumber", RuleValue::Integer(n)) => self.set_maximum_number(n),
            ("MinimumTime", RuleValue::Integer(ms)) => self.set_minimum_time(ms),
            ("MaximumTime", RuleValue::Integer(ms)) => self.set_maximum_time(ms),
            (rule, value) => {
                log::debug!(
                    "Clock '{}' ignoring rule '{rule}' with value {value:?}",
                    self.id
                );
            }
        }
    }
}
