//! Clock snapshots — the sole persistence/undo boundary of the core.
//!
//! A snapshot is an immutable value owned by the caller. It can only be
//! replayed into a clock whose id matches the one it was taken from.

use crate::clock::ClockState;
use crate::types::{ClockId, Millis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub id: ClockId,
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

impl ClockSnapshot {
    pub(crate) fn from_state(id: &str, state: &ClockState) -> Self {
        Self {
            id: id.to_string(),
            name: state.name.clone(),
            number: state.number,
            minimum_number: state.minimum_number,
            maximum_number: state.maximum_number,
            time: state.time,
            minimum_time: state.minimum_time,
            maximum_time: state.maximum_time,
            count_direction_down: state.count_direction_down,
            running: state.running,
        }
    }

    pub(crate) fn to_state(&self) -> ClockState {
        ClockState {
            name: self.name.clone(),
            number: self.number,
            minimum_number: self.minimum_number,
            maximum_number: self.maximum_number,
            time: self.time,
            minimum_time: self.minimum_time,
            maximum_time: self.maximum_time,
            count_direction_down: self.count_direction_down,
            running: self.running,
        }
    }
}
