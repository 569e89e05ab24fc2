//! The ticker — one background thread advancing every running clock.
//!
//! The thread wakes at a fixed cadence and feeds the real elapsed delta into
//! the session. Pausing discards elapsed time instead of banking it, and a
//! manual `advance` has exactly the effect of that much real time passing,
//! which is what makes the clock model testable without sleeping.

use crate::error::BoardResult;
use crate::session::SessionCore;
use crate::types::Millis;
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Fixed wake-up cadence of the ticker thread.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

struct TickerShared {
    core: Arc<SessionCore>,
    paused: AtomicBool,
    shutdown: AtomicBool,
}

pub struct Ticker {
    shared: Arc<TickerShared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub(crate) fn spawn(core: Arc<SessionCore>, paused: bool) -> BoardResult<Self> {
        let shared = Arc::new(TickerShared {
            core,
            paused: AtomicBool::new(paused),
            shutdown: AtomicBool::new(false),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("clock-ticker".to_string())
            .spawn(move || run(&thread_shared))
            .context("failed to spawn ticker thread")?;
        log::debug!("Ticker started (paused: {paused})");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Suspend automatic ticking. Time elapsing while paused is discarded.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    /// Resume automatic ticking from now; no catch-up tick is produced.
    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Advance all running clocks by an exact delta, indistinguishable from
    /// that much real time passing. Usable whether or not the ticker is
    /// paused; tests pause first so this is the only time source.
    pub fn advance(&self, elapsed: Millis) {
        self.shared.core.advance(elapsed);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        log::debug!("Ticker stopped");
    }
}

fn run(shared: &TickerShared) {
    let mut last = Instant::now();
    while !shared.shutdown.load(Ordering::Acquire) {
        thread::sleep(TICK_INTERVAL);
        let now = Instant::now();
        let elapsed = now.duration_since(last).as_millis() as Millis;
        last = now;
        if shared.paused.load(Ordering::Acquire) {
            continue;
        }
        shared.core.advance(elapsed);
    }
}
