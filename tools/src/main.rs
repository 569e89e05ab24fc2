//! board-runner: headless scoreboard clock runner.
//!
//! Usage:
//!   board-runner --seconds 5 --sync
//!
//! Wires a session with a period (master) and jam clock, lets the real-time
//! ticker run, and logs every whole state change as it happens.

use anyhow::Result;
use scoreboard_core::{
    settings, ClockProperty, EventFilter, MemorySettings, RuleValue, ScoreboardSession,
};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seconds = parse_arg(&args, "--seconds", 5u64);
    let sync = args.iter().any(|a| a == "--sync");

    let board_settings = Arc::new(MemorySettings::new());
    board_settings.set(settings::CLOCK_SYNC, sync);

    let session = ScoreboardSession::start(board_settings)?;
    let period = session.register_clock(scoreboard_core::types::ID_PERIOD, true)?;
    let jam = session.register_clock(scoreboard_core::types::ID_JAM, false)?;

    // A standard derby setup: 30 minute period, 2 minute jam, both counting
    // down, pushed through the rule interface the way a ruleset would.
    session.apply_rule("Clock.Period.Name", RuleValue::from("Period"));
    session.apply_rule("Clock.Period.Direction", RuleValue::from(true));
    session.apply_rule("Clock.Period.MaximumNumber", RuleValue::from(2i64));
    session.apply_rule("Clock.Period.MaximumTime", RuleValue::from(30 * 60 * 1000i64));
    session.apply_rule("Clock.Jam.Name", RuleValue::from("Jam"));
    session.apply_rule("Clock.Jam.Direction", RuleValue::from(true));
    session.apply_rule("Clock.Jam.MaximumNumber", RuleValue::from(99i64));
    session.apply_rule("Clock.Jam.MaximumTime", RuleValue::from(2 * 60 * 1000i64));

    session.events().subscribe(EventFilter::any(), |event| {
        if event.property == ClockProperty::Time {
            log::info!("{}: {:?} -> {:?}", event.clock, event.previous, event.value);
        }
    });

    period.start_next();
    jam.start_next();
    period.start();
    jam.start();

    log::info!("Running clocks for {seconds}s (sync: {sync})");
    thread::sleep(Duration::from_secs(seconds));

    period.stop();
    jam.stop();

    println!(
        "Period {}: {}ms elapsed, {}ms remaining",
        period.number(),
        period.time_elapsed(),
        period.time_remaining()
    );
    println!(
        "Jam {}: {}ms elapsed, {}ms remaining",
        jam.number(),
        jam.time_elapsed(),
        jam.time_remaining()
    );

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
