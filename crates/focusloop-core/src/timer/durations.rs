use serde::{Deserialize, Serialize};

/// Default work interval: 25 minutes.
pub const DEFAULT_WORK_SECS: u64 = 25 * 60;
/// Default break interval: 5 minutes.
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60;

/// Work and break interval lengths in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDurations {
    pub work_secs: u64,
    pub break_secs: u64,
}

impl TimerDurations {
    /// Build from signed config values. Negative durations clamp to zero,
    /// which makes the interval complete on the next tick.
    pub fn from_signed(work_secs: i64, break_secs: i64) -> Self {
        Self {
            work_secs: work_secs.max(0) as u64,
            break_secs: break_secs.max(0) as u64,
        }
    }

    /// Whole minutes credited for one completed work interval.
    pub fn work_minutes(&self) -> u64 {
        (self.work_secs + 30) / 60
    }
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_SECS,
            break_secs: DEFAULT_BREAK_SECS,
        }
    }
}
