//! Settings collaborator — dotted-name lookups provided by the host.
//!
//! The core only reads booleans from it. A failing lookup must never corrupt
//! clock state; callers treat an error as "feature disabled right now".

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Setting controlling master/dependent time synchronization.
pub const CLOCK_SYNC: &str = "ScoreBoard.Clock.Sync";

pub trait Settings: Send + Sync {
    fn get_bool(&self, key: &str) -> Result<bool>;
}

/// In-memory settings, used by tests and the demo runner. Unset keys
/// read as false.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, bool>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: bool) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }
}

impl Settings for MemorySettings {
    fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().unwrap().get(key).copied().unwrap_or(false))
    }
}
