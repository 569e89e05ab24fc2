//! Shared primitive types used across the scoreboard core.

/// A stable clock identifier, unique within one scoreboard session.
pub type ClockId = String;

/// Clock time in milliseconds. All clock arithmetic is integral.
pub type Millis = i64;

/// One whole second of clock time.
pub const SECOND_MS: Millis = 1000;

/// Well-known clock ids used by a standard game setup.
pub const ID_PERIOD: &str = "Period";
pub const ID_JAM: &str = "Jam";
pub const ID_LINEUP: &str = "Lineup";
pub const ID_TIMEOUT: &str = "Timeout";
pub const ID_INTERMISSION: &str = "Intermission";
