//! Property-based tests for board reordering.
//!
//! Uses proptest to check the placement rules for arbitrary boards.

use focusloop_core::board::{column, column_index, compute_new_order, Task, TaskStatus};
use proptest::prelude::*;
use proptest::sample::Index;

fn status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Done),
    ]
}

fn board_strategy() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(status_strategy(), 1..12).prop_map(|statuses| {
        statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                let mut task = Task::new(format!("task {i}"), i as u64);
                task.id = format!("t{i}");
                task.status = status;
                task
            })
            .collect()
    })
}

fn ids_of(tasks: &[&Task]) -> Vec<String> {
    tasks.iter().map(|t| t.id.clone()).collect()
}

proptest! {
    /// Every id survives exactly once.
    #[test]
    fn ids_are_preserved(
        tasks in board_strategy(),
        pick in any::<Index>(),
        status in status_strategy(),
        target in -3i64..15,
    ) {
        let moved = &tasks[pick.index(tasks.len())];
        let result = compute_new_order(&tasks, &moved.id, status, target);

        let mut before: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut after: Vec<&str> = result.iter().map(|t| t.id.as_str()).collect();
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    /// The moved task lands in the destination column at the clamped,
    /// removal-adjusted index.
    #[test]
    fn moved_task_lands_at_target(
        tasks in board_strategy(),
        pick in any::<Index>(),
        status in status_strategy(),
        target in -3i64..15,
    ) {
        let moved = tasks[pick.index(tasks.len())].clone();
        let result = compute_new_order(&tasks, &moved.id, status, target);

        let landed = result.iter().find(|t| t.id == moved.id).unwrap();
        prop_assert_eq!(landed.status, status);

        let others_in_column = column(&tasks, status)
            .into_iter()
            .filter(|t| t.id != moved.id)
            .count() as i64;
        let mut adjusted = target;
        if moved.status == status && (column_index(&tasks, &moved.id).unwrap() as i64) < target {
            adjusted -= 1;
        }
        let expected = if adjusted < 0 { others_in_column } else { adjusted.min(others_in_column) };
        prop_assert_eq!(column_index(&result, &moved.id), Some(expected as usize));
    }

    /// Tasks other than the moved one keep their relative order, both
    /// within each column and across the board outside the destination.
    #[test]
    fn untouched_tasks_keep_relative_order(
        tasks in board_strategy(),
        pick in any::<Index>(),
        status in status_strategy(),
        target in -3i64..15,
    ) {
        let moved_id = tasks[pick.index(tasks.len())].id.clone();
        let result = compute_new_order(&tasks, &moved_id, status, target);

        for col in TaskStatus::ALL {
            let before: Vec<String> = ids_of(&column(&tasks, col))
                .into_iter()
                .filter(|id| *id != moved_id)
                .collect();
            let after: Vec<String> = ids_of(&column(&result, col))
                .into_iter()
                .filter(|id| *id != moved_id)
                .collect();
            prop_assert_eq!(before, after);
        }

        let outside = |list: &[Task]| -> Vec<String> {
            list.iter()
                .filter(|t| t.id != moved_id && t.status != status)
                .map(|t| t.id.clone())
                .collect()
        };
        prop_assert_eq!(outside(&tasks), outside(&result));
    }

    /// Dropping a task back onto its own slot changes no column.
    #[test]
    fn dropping_in_place_is_identity(
        tasks in board_strategy(),
        pick in any::<Index>(),
    ) {
        let moved = &tasks[pick.index(tasks.len())];
        let index = column_index(&tasks, &moved.id).unwrap() as i64;
        let result = compute_new_order(&tasks, &moved.id, moved.status, index);

        for col in TaskStatus::ALL {
            prop_assert_eq!(ids_of(&column(&tasks, col)), ids_of(&column(&result, col)));
        }
    }

    /// Unknown ids leave the board untouched.
    #[test]
    fn unknown_id_is_noop(
        tasks in board_strategy(),
        status in status_strategy(),
        target in -3i64..15,
    ) {
        prop_assert_eq!(compute_new_order(&tasks, "missing", status, target), tasks);
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut task = Task::new(id.to_uppercase(), 0);
        task.id = id.to_string();
        task.status = status;
        task
    }

    #[test]
    fn cross_column_drop_to_front() {
        let tasks = vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Todo),
            task("c", TaskStatus::InProgress),
        ];
        let result = compute_new_order(&tasks, "a", TaskStatus::InProgress, 0);
        assert_eq!(ids_of(&column(&result, TaskStatus::Todo)), vec!["b"]);
        assert_eq!(ids_of(&column(&result, TaskStatus::InProgress)), vec!["a", "c"]);
    }

    #[test]
    fn same_column_drop_below_neighbour() {
        let tasks = vec![
            task("a", TaskStatus::Todo),
            task("b", TaskStatus::Todo),
            task("c", TaskStatus::Todo),
        ];
        let result = compute_new_order(&tasks, "a", TaskStatus::Todo, 2);
        assert_eq!(ids_of(&column(&result, TaskStatus::Todo)), vec!["b", "a", "c"]);
    }
}
