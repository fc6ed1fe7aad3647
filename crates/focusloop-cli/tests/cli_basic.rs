//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusloop"))
        .args(args)
        .env("FOCUSLOOP_DATA_DIR", data_dir)
        .env_remove("FOCUSLOOP_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "command {args:?} failed: {stderr}");
    stdout
}

/// Extract the id from a "<Thing> created: <id>" line.
fn created_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.split_once("created: ").map(|(_, id)| id.trim().to_string()))
        .expect("no created id in output")
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("output is not JSON")
}

#[test]
fn test_project_create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let id = created_id(&run_ok(dir.path(), &["project", "create", "Website", "--days", "1", "--hours", "2"]));

    let projects = json(&run_ok(dir.path(), &["project", "list", "--json"]));
    assert_eq!(projects[0]["id"], id.as_str());
    assert_eq!(projects[0]["totalTimeMinutes"], 600);
    assert_eq!(projects[0]["timeSpentMinutes"], 0);
}

#[test]
fn test_task_without_project_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["task", "add", "Orphan"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No active project"), "stderr: {stderr}");
}

#[test]
fn test_task_move_reorders_column() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["project", "create", "Board"]);
    let a = created_id(&run_ok(dir.path(), &["task", "add", "A"]));
    let _b = created_id(&run_ok(dir.path(), &["task", "add", "B"]));
    let c = created_id(&run_ok(dir.path(), &["task", "add", "C"]));

    let moved = json(&run_ok(dir.path(), &["task", "move", &c[..8], "todo", "--index", "0"]));
    assert_eq!(moved["type"], "TaskMoved");
    assert_eq!(moved["column_index"], 0);

    run_ok(dir.path(), &["task", "move", &a, "done"]);
    let tasks = json(&run_ok(dir.path(), &["task", "list", "--json"]));
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["C", "B", "A"]);
    assert_eq!(tasks[2]["status"], "done");
}

#[test]
fn test_focus_detaches_when_done() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["project", "create", "Focus"]);
    let task = created_id(&run_ok(dir.path(), &["task", "add", "Deep work"]));

    run_ok(dir.path(), &["task", "focus", &task]);
    let current = json(&run_ok(dir.path(), &["task", "current"]));
    assert_eq!(current["id"], task.as_str());

    run_ok(dir.path(), &["timer", "start"]);
    run_ok(dir.path(), &["task", "status", &task, "done"]);
    let stdout = run_ok(dir.path(), &["task", "current"]);
    assert!(stdout.contains("no focused task"));

    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["phase"], "idle");
}

#[test]
fn test_timer_start_pause_status() {
    let dir = tempfile::tempdir().unwrap();
    let started = json(&run_ok(dir.path(), &["timer", "start"]));
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["mode"], "work");

    let paused = json(&run_ok(dir.path(), &["timer", "pause"]));
    assert_eq!(paused["type"], "TimerPaused");

    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["phase"], "paused");
    assert_eq!(status["total_secs"], 1500);

    run_ok(dir.path(), &["timer", "reset"]);
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["phase"], "idle");
    assert_eq!(status["remaining_secs"], 1500);
}

#[test]
fn test_short_work_interval_credits_project() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "timer.work_secs", "0"]);
    run_ok(dir.path(), &["project", "create", "Sprint"]);
    run_ok(dir.path(), &["timer", "start"]);

    // A zero-length interval is complete by the next command's catch-up tick.
    let stdout = run_ok(dir.path(), &["timer", "status"]);
    assert!(stdout.contains("SessionCompleted"));
    assert!(stdout.contains("BudgetUpdated"));
}

#[test]
fn test_finished_interval_credited_before_move_to_done() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["config", "set", "timer.work_secs", "30"]);
    run_ok(dir.path(), &["project", "create", "Errands"]);
    let task = created_id(&run_ok(dir.path(), &["task", "add", "Post office"]));
    run_ok(dir.path(), &["task", "focus", &task]);
    run_ok(dir.path(), &["timer", "start"]);

    // Nothing ticks while the interval runs out.
    std::thread::sleep(std::time::Duration::from_millis(31_500));

    let stdout = run_ok(dir.path(), &["task", "move", &task, "done"]);
    assert!(stdout.contains("SessionCompleted"), "stdout: {stdout}");
    assert!(stdout.contains("FocusCleared"), "stdout: {stdout}");

    let projects = json(&run_ok(dir.path(), &["project", "list", "--json"]));
    assert_eq!(projects[0]["timeSpentMinutes"], 1);
    let status = json(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status["phase"], "idle");
}

#[test]
fn test_subtask_toggle() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["project", "create", "Lists"]);
    let task = created_id(&run_ok(dir.path(), &["task", "add", "Pack"]));
    let sub = created_id(&run_ok(dir.path(), &["subtask", "add", &task, "Socks"]));

    assert_eq!(run_ok(dir.path(), &["subtask", "toggle", &task, &sub]).trim(), "completed");
    assert_eq!(run_ok(dir.path(), &["subtask", "toggle", &task, &sub]).trim(), "open");
    run_ok(dir.path(), &["subtask", "delete", &task, &sub]);
    let current = json(&run_ok(dir.path(), &["task", "list", "--json"]));
    assert_eq!(current[0]["subtasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.break_secs"]).trim(), "300");
    run_ok(dir.path(), &["config", "set", "timer.break_secs", "120"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.break_secs"]).trim(), "120");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = run_ok(dir.path(), &["completions", "bash"]);
    assert!(stdout.contains("focusloop"));
}
