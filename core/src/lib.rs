//! scoreboard-core: the live sports-timing engine.
//!
//! A scoreboard session owns a set of independently configured clocks
//! (period, jam, timeout, ...) that tick in real time, clamp their number and
//! time axes into configured bounds, publish every state change as an event,
//! support snapshot/restore, and keep a designated master clock and its
//! dependents aligned through whole-second synchronization.

pub mod clock;
pub mod error;
pub mod event;
pub mod rules;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod ticker;
pub mod types;

mod sync;

pub use clock::Clock;
pub use error::{BoardError, BoardResult};
pub use event::{ClockEvent, ClockProperty, EventBus, EventFilter, PropertyValue};
pub use rules::RuleValue;
pub use session::ScoreboardSession;
pub use settings::{MemorySettings, Settings};
pub use snapshot::ClockSnapshot;
pub use ticker::Ticker;
