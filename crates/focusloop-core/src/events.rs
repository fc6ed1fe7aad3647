use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::TaskStatus;
use crate::timer::{TimerMode, TimerPhase};

/// Every state change in the system produces an Event.
/// The CLI prints them; the session controller routes timer completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        remaining_secs: u64,
        deadline_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        auto_start: bool,
        at: DateTime<Utc>,
    },
    /// A work interval ran out. The engine has already switched to break.
    SessionCompleted {
        minutes: u64,
        at: DateTime<Utc>,
    },
    /// The break after a work interval ran out. The engine is paused in
    /// break mode until reset.
    SequenceCompleted {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        mode: TimerMode,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        at: DateTime<Utc>,
    },
    FocusStarted {
        task_id: String,
        at: DateTime<Utc>,
    },
    FocusCleared {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskMoved {
        task_id: String,
        status: TaskStatus,
        column_index: usize,
        at: DateTime<Utc>,
    },
    BudgetUpdated {
        project_id: String,
        added_minutes: u64,
        time_spent_minutes: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the two completion events the controller reacts to.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::SequenceCompleted { .. }
        )
    }
}
