//! The scoreboard session — the owning context for a set of clocks.
//!
//! RULES:
//!   - Clocks are advanced in registration order, every tick, before any
//!     cross-clock synchronization is evaluated.
//!   - The master/dependent pairing is an explicit relation held here, not a
//!     convention on clock ids.
//!   - The ticker is owned by the session: spawned on start, joined on drop.
//!     No global timer state.

use crate::clock::Clock;
use crate::error::{BoardError, BoardResult};
use crate::event::EventBus;
use crate::rules::RuleValue;
use crate::settings::{self, Settings};
use crate::snapshot::ClockSnapshot;
use crate::sync::Synchronizer;
use crate::ticker::Ticker;
use crate::types::{ClockId, Millis};
use std::sync::{Arc, Mutex};

/// Shared state driven by both external callers and the ticker thread.
pub(crate) struct SessionCore {
    bus: Arc<EventBus>,
    settings: Arc<dyn Settings>,
    clocks: Mutex<Vec<Arc<Clock>>>,
    master: Mutex<Option<ClockId>>,
    sync: Synchronizer,
}

impl SessionCore {
    /// Advance every running clock by `elapsed` real milliseconds, then run
    /// the synchronization pass over this tick's coherent deltas.
    pub(crate) fn advance(&self, elapsed: Millis) {
        if elapsed <= 0 {
            return;
        }
        let clocks: Vec<Arc<Clock>> = self.clocks.lock().unwrap().clone();
        let mut ticked: Vec<Arc<Clock>> = Vec::new();
        for clock in &clocks {
            if clock.is_running() {
                clock.elapse_time(elapsed);
                ticked.push(Arc::clone(clock));
            }
        }
        self.sync_pass(&clocks, &ticked, elapsed);
    }

    fn sync_pass(&self, clocks: &[Arc<Clock>], ticked: &[Arc<Clock>], elapsed: Millis) {
        let enabled = match self.settings.get_bool(settings::CLOCK_SYNC) {
            Ok(enabled) => enabled,
            Err(err) => {
                log::warn!("Clock sync setting unavailable, sync skipped this tick: {err:#}");
                false
            }
        };
        if !enabled {
            self.sync.clear();
            return;
        }
        let master_id = self.master.lock().unwrap().clone();
        let Some(master) = master_id.and_then(|id| clocks.iter().find(|c| c.id() == id).cloned())
        else {
            return;
        };
        for clock in ticked {
            if clock.id() == master.id() {
                for dependent in clocks.iter().filter(|c| c.id() != master.id()) {
                    self.sync.accumulate(clock, dependent, elapsed);
                }
            } else {
                self.sync.accumulate(clock, &master, elapsed);
            }
        }
    }
}

/// One scoreboard session: the clocks, their event bus, the settings
/// collaborator, the sync pairing and the ticker lifecycle.
pub struct ScoreboardSession {
    core: Arc<SessionCore>,
    ticker: Ticker,
}

impl ScoreboardSession {
    /// Start a session with a live ticker.
    pub fn start(settings: Arc<dyn Settings>) -> BoardResult<Self> {
        Self::build(settings, false)
    }

    /// Start a session with the ticker paused. Tests use this together with
    /// `Ticker::advance` for deterministic time.
    pub fn start_paused(settings: Arc<dyn Settings>) -> BoardResult<Self> {
        Self::build(settings, true)
    }

    fn build(settings: Arc<dyn Settings>, paused: bool) -> BoardResult<Self> {
        let core = Arc::new(SessionCore {
            bus: Arc::new(EventBus::new()),
            settings,
            clocks: Mutex::new(Vec::new()),
            master: Mutex::new(None),
            sync: Synchronizer::new(),
        });
        let ticker = Ticker::spawn(Arc::clone(&core), paused)?;
        Ok(Self { core, ticker })
    }

    /// Register a clock. Registration order is the deterministic order in
    /// which clocks are advanced each tick. At most one clock per session may
    /// be the master.
    pub fn register_clock(&self, id: &str, master: bool) -> BoardResult<Arc<Clock>> {
        let mut clocks = self.core.clocks.lock().unwrap();
        if clocks.iter().any(|c| c.id() == id) {
            return Err(BoardError::DuplicateClock { id: id.to_string() });
        }
        if master {
            let mut designated = self.core.master.lock().unwrap();
            if let Some(existing) = designated.as_ref() {
                return Err(BoardError::MasterAlreadyDesignated {
                    id: existing.clone(),
                });
            }
            *designated = Some(id.to_string());
        }
        let clock = Clock::new(id, master, Arc::clone(&self.core.bus));
        clocks.push(Arc::clone(&clock));
        log::debug!("Registered clock '{id}' (master: {master})");
        Ok(clock)
    }

    pub fn clock(&self, id: &str) -> BoardResult<Arc<Clock>> {
        self.core
            .clocks
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or_else(|| BoardError::UnknownClock { id: id.to_string() })
    }

    pub fn master_clock(&self) -> Option<Arc<Clock>> {
        let master_id = self.core.master.lock().unwrap().clone()?;
        self.clock(&master_id).ok()
    }

    /// The session-wide event bus all clocks publish to.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.core.bus
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Broadcast a rule to every clock; each clock applies it only if the
    /// key addresses its own id.
    pub fn apply_rule(&self, key: &str, value: RuleValue) {
        let clocks: Vec<Arc<Clock>> = self.core.clocks.lock().unwrap().clone();
        for clock in clocks {
            clock.apply_rule(key, value.clone());
        }
    }

    /// Capture every clock's state, e.g. for undo.
    pub fn snapshot(&self) -> Vec<ClockSnapshot> {
        let clocks: Vec<Arc<Clock>> = self.core.clocks.lock().unwrap().clone();
        clocks.iter().map(|c| c.snapshot()).collect()
    }

    /// Replay a set of snapshots; each one restores only the clock whose id
    /// matches. Snapshots for unknown clocks are ignored.
    pub fn restore(&self, snapshots: &[ClockSnapshot]) {
        let clocks: Vec<Arc<Clock>> = self.core.clocks.lock().unwrap().clone();
        for snapshot in snapshots {
            for clock in &clocks {
                clock.restore_snapshot(snapshot);
            }
        }
    }
}
