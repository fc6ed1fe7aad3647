mod clock;
mod durations;
pub mod driver;
mod engine;
mod haptics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{spawn_ticker, TickTarget, TickerHandle};
pub use durations::{TimerDurations, DEFAULT_BREAK_SECS, DEFAULT_WORK_SECS};
pub use engine::{TickLease, TimerEngine, TimerMode, TimerPhase, TimerState};
pub use haptics::{HapticPatterns, HapticSink, SEQUENCE_COMPLETE_PATTERN, WORK_COMPLETE_PATTERN};
