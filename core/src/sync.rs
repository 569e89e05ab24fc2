//! Master/dependent time synchronization.
//!
//! Elapsed-time deltas from ticking accumulate per (source, target) pair and
//! commit to the target only in whole seconds; the sub-second remainder is
//! retained. Commits never feed back into accumulation, so a master and its
//! dependents cannot chase each other.

use crate::clock::Clock;
use crate::types::{ClockId, Millis, SECOND_MS};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct Synchronizer {
    accumulators: Mutex<HashMap<(ClockId, ClockId), Millis>>,
}

impl Synchronizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drop all accumulated sub-second remainders. Called while sync is
    /// disabled so that enabling it mid-session starts from zero.
    pub(crate) fn clear(&self) {
        self.accumulators.lock().unwrap().clear();
    }

    /// Accumulate an elapsed delta from `source` toward `target` and commit
    /// the whole-second portion. A stopped target receives nothing and
    /// accumulates nothing.
    pub(crate) fn accumulate(&self, source: &Clock, target: &Clock, delta: Millis) {
        if !target.is_running() {
            return;
        }
        let commit = {
            let mut accumulators = self.accumulators.lock().unwrap();
            let buffered = accumulators
                .entry((source.id().to_string(), target.id().to_string()))
                .or_insert(0);
            *buffered += delta;
            let whole = (*buffered / SECOND_MS) * SECOND_MS;
            *buffered -= whole;
            whole
        };
        if commit != 0 {
            // The committed delta is elapsed time, so it moves the target in
            // its own counting direction.
            let signed = if target.is_count_direction_down() {
                -commit
            } else {
                commit
            };
            log::trace!(
                "Sync committing {commit}ms from clock '{}' to clock '{}'",
                source.id(),
                target.id()
            );
            target.change_time(signed);
        }
    }
}
