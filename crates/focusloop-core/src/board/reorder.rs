//! Drag-and-drop placement of a task into a column.
//!
//! The board keeps a single flat task list. Placement rebuilds it as "every
//! task not in the destination column, in order" followed by "the
//! destination column, in order, with the moved task spliced in". Tasks
//! outside the destination column keep their relative order, and so do the
//! untouched tasks inside it.

use serde::{Deserialize, Serialize};

use super::{Task, TaskStatus};

/// Where to drop a task inside its destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveTarget {
    Index(usize),
    End,
}

impl MoveTarget {
    /// Raw target index as understood by [`compute_new_order`].
    pub fn as_raw(self) -> i64 {
        match self {
            MoveTarget::Index(i) => i64::try_from(i).unwrap_or(i64::MAX),
            MoveTarget::End => -1,
        }
    }
}

impl From<usize> for MoveTarget {
    fn from(index: usize) -> Self {
        MoveTarget::Index(index)
    }
}

/// Tasks with `status`, in board order.
pub fn column(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

/// Position of `task_id` within its own column.
pub fn column_index(tasks: &[Task], task_id: &str) -> Option<usize> {
    let task = tasks.iter().find(|t| t.id == task_id)?;
    column(tasks, task.status)
        .iter()
        .position(|t| t.id == task_id)
}

/// New task order after dropping `moved_task_id` into `new_status` at
/// `target_index`.
///
/// `target_index` counts positions in the destination column as the user
/// sees it *before* the drag. Negative values append to the end of the
/// column and indexes past the end are clamped. An unknown id returns the
/// input unchanged.
pub fn compute_new_order(
    tasks: &[Task],
    moved_task_id: &str,
    new_status: TaskStatus,
    target_index: i64,
) -> Vec<Task> {
    let Some(moved) = tasks.iter().find(|t| t.id == moved_task_id) else {
        return tasks.to_vec();
    };

    let mut target = target_index;
    if moved.status == new_status {
        // Dropping below its own slot: the removal shifts everything up one.
        if let Some(source) = column_index(tasks, moved_task_id) {
            if (source as i64) < target {
                target -= 1;
            }
        }
    }

    let (mut destination, others): (Vec<Task>, Vec<Task>) = tasks
        .iter()
        .filter(|t| t.id != moved_task_id)
        .cloned()
        .partition(|t| t.status == new_status);

    let len = destination.len();
    let index = if target < 0 {
        len
    } else {
        usize::try_from(target).unwrap_or(len).min(len)
    };

    let mut moved = moved.clone();
    moved.status = new_status;
    destination.insert(index, moved);

    let mut result = others;
    result.extend(destination);
    result
}
