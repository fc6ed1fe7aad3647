//! Integration tests for the focus session.
//!
//! These drive the controller the way the CLI does: a ticker on the shared
//! controller, completion events credited to projects, and the board saved
//! through a SQLite-backed store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use focusloop_core::storage::{Database, ProjectStore, STORAGE_KEY};
use focusloop_core::timer::{HapticPatterns, HapticSink};
use focusloop_core::{
    spawn_ticker, Event, ManualClock, SessionController, TaskStatus, TimerDurations, TimerMode,
    TimerPhase,
};

#[derive(Debug, Default)]
struct RecordingSink {
    calls: Mutex<Vec<Vec<u64>>>,
}

impl HapticSink for RecordingSink {
    fn vibrate(&self, pattern: &[u64]) {
        self.calls.lock().unwrap().push(pattern.to_vec());
    }
}

fn durations() -> TimerDurations {
    TimerDurations {
        work_secs: 1_500,
        break_secs: 300,
    }
}

#[test]
fn test_full_sequence_with_late_ticks() {
    let clock = ManualClock::new(10_000);
    let sink = Arc::new(RecordingSink::default());
    let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()))
        .with_haptics(sink.clone(), HapticPatterns::default());

    let project = session.create_project("Launch", 2, 0).unwrap();
    let task = session.add_task("Write copy").unwrap();
    session.start_focus(&task).unwrap();
    session.start_timer();

    // A throttled process sees one tick, two minutes late.
    clock.advance_secs(1_620);
    let events = session.tick();
    assert!(matches!(events[0], Event::SessionCompleted { minutes: 25, .. }));
    assert_eq!(session.timer().mode(), TimerMode::Break);
    // The break is measured from when the completion was observed.
    assert_eq!(session.timer().remaining_secs(), 300);

    clock.advance_ms(299_001);
    assert!(session.tick().is_empty());
    assert_eq!(session.timer().remaining_secs(), 1);

    clock.advance_ms(999);
    let events = session.tick();
    assert!(matches!(events[0], Event::SequenceCompleted { .. }));
    assert_eq!(session.timer().phase(), TimerPhase::Paused);
    assert_eq!(session.project(&project).unwrap().time_spent_minutes, 25);

    let calls = sink.calls.lock().unwrap();
    assert_eq!(calls.as_slice(), &[vec![200, 100, 200], vec![200, 100, 200, 100, 500]]);
}

#[test]
fn test_pause_resume_keeps_remaining() {
    let clock = ManualClock::new(0);
    let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()));
    session.start_timer();

    clock.advance_ms(10_400);
    session.pause_timer();
    assert_eq!(session.timer().remaining_secs(), 1_490);

    // Time spent paused does not count.
    clock.advance_secs(3_600);
    assert!(session.tick().is_empty());
    session.toggle_timer();
    clock.advance_secs(1_489);
    assert!(session.tick().is_empty());
    clock.advance_secs(1);
    assert!(matches!(session.tick()[0], Event::SessionCompleted { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_ticker_drives_controller() {
    let clock = ManualClock::new(0);
    let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()));
    let project = session.create_project("Deep work", 0, 4).unwrap();
    session.start_timer();
    let session = Arc::new(Mutex::new(session));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = spawn_ticker(session.clone(), Duration::from_millis(250), move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    clock.advance_secs(1_500);
    assert!(matches!(rx.recv().await.unwrap(), Event::SessionCompleted { .. }));
    assert!(matches!(rx.recv().await.unwrap(), Event::BudgetUpdated { time_spent_minutes: 25, .. }));

    clock.advance_secs(300);
    assert!(matches!(rx.recv().await.unwrap(), Event::SequenceCompleted { .. }));

    // Sequence completion revokes the lease, so the ticker winds down.
    handle.finished().await;
    let session = session.lock().unwrap();
    assert_eq!(session.project(&project).unwrap().time_spent_minutes, 25);
}

#[tokio::test(start_paused = true)]
async fn test_ticker_follows_reset_into_new_run() {
    let clock = ManualClock::new(0);
    let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()));
    session.create_project("p", 0, 1).unwrap();
    session.start_timer();
    let session = Arc::new(Mutex::new(session));

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let _handle = spawn_ticker(session.clone(), Duration::from_millis(250), move |event| {
        let _ = tx.send(event);
    })
    .unwrap();

    clock.advance_secs(900);
    session.lock().unwrap().reset_timer(true);

    // The first run's deadline passes without completing anything.
    clock.advance_secs(600);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(session.lock().unwrap().active_project().unwrap().time_spent_minutes, 0);

    // The restarted run completes on its own deadline.
    clock.advance_secs(900);
    assert!(matches!(rx.recv().await.unwrap(), Event::SessionCompleted { minutes: 25, .. }));
    assert!(matches!(rx.recv().await.unwrap(), Event::BudgetUpdated { time_spent_minutes: 25, .. }));
    let session = session.lock().unwrap();
    assert_eq!(session.timer().mode(), TimerMode::Break);
}

#[test]
fn test_board_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusloop.db");
    let clock = ManualClock::new(0);

    let (task_a, task_b) = {
        let mut store = ProjectStore::new(Database::open_at(&path).unwrap(), 1_000);
        let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()));
        session.create_project("Garden", 0, 6).unwrap();
        let a = session.add_task("Seeds").unwrap();
        let b = session.add_task("Soil").unwrap();
        session.move_task(&b, TaskStatus::InProgress, 0).unwrap();
        session.add_subtask(&b, "compost").unwrap();
        session.start_focus(&b).unwrap();
        session.save_now(&mut store).unwrap();
        (a, b)
    };

    let store = ProjectStore::new(Database::open_at(&path).unwrap(), 1_000);
    assert!(store.backend().kv_get(STORAGE_KEY).unwrap().is_some());
    let session = SessionController::restore(&store, durations(), Arc::new(clock));

    let project = session.active_project().unwrap();
    assert_eq!(project.title, "Garden");
    assert_eq!(project.total_time_minutes, 360);
    assert_eq!(project.task(&task_a).unwrap().status, TaskStatus::Todo);
    assert_eq!(project.task(&task_b).unwrap().status, TaskStatus::InProgress);
    assert_eq!(project.task(&task_b).unwrap().subtasks.len(), 1);
    assert_eq!(session.active_task_id(), Some(task_b.as_str()));
    assert_eq!(session.timer().phase(), TimerPhase::Idle);
}

#[test]
fn test_restore_drops_dangling_focus() {
    let clock = ManualClock::new(0);
    let mut store = ProjectStore::new(Database::open_memory().unwrap(), 1_000);
    let mut session = SessionController::with_clock(Vec::new(), durations(), Arc::new(clock.clone()));
    session.create_project("p", 0, 1).unwrap();
    let task = session.add_task("t").unwrap();
    session.start_focus(&task).unwrap();
    store.save_session(&session.snapshot()).unwrap();

    // Board saved after the task was deleted; the stale session still names it.
    session.delete_task(&task).unwrap();
    store.flush(session.projects()).unwrap();

    let restored = SessionController::restore(&store, durations(), Arc::new(clock));
    assert!(restored.active_task_id().is_none());
}
