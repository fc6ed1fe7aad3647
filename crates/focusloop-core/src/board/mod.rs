//! Kanban board data model.
//!
//! A [`Project`] owns an ordered list of [`Task`]s. There is no stored
//! position field: a task's place in its column is its rank among the
//! project's tasks that share its status, so column order is always a gap
//! free total order.

mod reorder;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use reorder::{column, column_index, compute_new_order, MoveTarget};

/// Column a task lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading shown on the board.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "Active",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" | "in_progress" | "inprogress" | "active" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Epoch milliseconds.
    pub created_at: u64,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// A new `todo` task.
    pub fn new(title: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            created_at,
            subtasks: Vec::new(),
        }
    }

    pub fn subtask_mut(&mut self, subtask_id: &str) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == subtask_id)
    }

    /// `(completed, total)` subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }
}

/// Default budget when a project is created with no time at all.
pub const MIN_PROJECT_BUDGET_MINUTES: u64 = 60;
/// Working hours counted per budget day.
pub const HOURS_PER_BUDGET_DAY: i64 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub total_time_minutes: u64,
    #[serde(default)]
    pub time_spent_minutes: u64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Budget summary for a project header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub spent_hours: f64,
    pub total_hours: f64,
    /// Capped at 100.
    pub percent_used: f64,
    /// More than 90% of the budget is gone.
    pub near_limit: bool,
}

impl Project {
    /// Budget is `(days * 8 + hours) * 60` minutes, or one hour when that
    /// comes out non-positive.
    pub fn new(title: impl Into<String>, days: i64, hours: i64) -> Self {
        let minutes = days
            .saturating_mul(HOURS_PER_BUDGET_DAY)
            .saturating_add(hours)
            .saturating_mul(60);
        let total_time_minutes = if minutes <= 0 {
            MIN_PROJECT_BUDGET_MINUTES
        } else {
            minutes as u64
        };
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            total_time_minutes,
            time_spent_minutes: 0,
            tasks: Vec::new(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Tasks of one column, in column order.
    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        column(&self.tasks, status)
    }

    pub fn budget_usage(&self) -> BudgetUsage {
        let spent_hours = self.time_spent_minutes as f64 / 60.0;
        let total_hours = self.total_time_minutes as f64 / 60.0;
        let percent_used = if self.total_time_minutes == 0 {
            100.0
        } else {
            (self.time_spent_minutes as f64 / self.total_time_minutes as f64 * 100.0).min(100.0)
        };
        BudgetUsage {
            spent_hours,
            total_hours,
            percent_used,
            near_limit: percent_used > 90.0,
        }
    }
}
