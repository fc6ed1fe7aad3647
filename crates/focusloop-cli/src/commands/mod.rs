//! Subcommand implementations.
//!
//! Every command loads the board and session from the data directory, catches
//! the timer up with the wall clock, applies one operation through the
//! session controller and saves before exiting.

pub mod completions;
pub mod config;
pub mod project;
pub mod subtask;
pub mod task;
pub mod timer;

use std::sync::Arc;

use focusloop_core::storage::{Config, Database, ProjectStore};
use focusloop_core::{Event, HapticSink, SessionController, StorageError, SystemClock};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Rings the terminal bell in place of a vibration motor.
#[derive(Debug)]
struct TerminalBell;

impl HapticSink for TerminalBell {
    fn vibrate(&self, pattern: &[u64]) {
        tracing::debug!(?pattern, "ringing terminal bell");
        eprint!("\x07");
    }
}

/// The session controller together with the store it persists to.
pub struct Workspace {
    pub session: SessionController,
    pub store: ProjectStore<Database>,
    pub config: Config,
    /// Events from the catch-up tick taken on open.
    caught_up: Vec<Event>,
}

impl Workspace {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let store = ProjectStore::new(Database::open()?, config.storage.debounce_ms);
        let mut session = SessionController::restore(&store, config.durations(), Arc::new(SystemClock));
        if config.haptics.enabled {
            session = session.with_haptics(Arc::new(TerminalBell), config.haptic_patterns());
        }
        // An interval may have run out while no process was ticking. Credit it
        // before any command can reset the timer or move its task.
        let caught_up = session.tick();
        if !caught_up.is_empty() {
            tracing::info!(events = caught_up.len(), "timer caught up on open");
        }
        Ok(Self {
            session,
            store,
            config,
            caught_up,
        })
    }

    /// Take the catch-up events so the caller can print them ahead of its own.
    pub fn take_caught_up(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.caught_up)
    }

    /// Write the board and session state.
    pub fn save(&mut self) -> Result<(), StorageError> {
        self.session.save_now(&mut self.store)
    }

    /// Resolve a project id from a unique prefix.
    pub fn project_id(&self, prefix: &str) -> Result<String, String> {
        resolve("project", prefix, self.session.projects().iter().map(|p| p.id.as_str()))
    }

    /// Resolve a task id from a unique prefix, searching every project.
    pub fn task_id(&self, prefix: &str) -> Result<String, String> {
        let ids = self
            .session
            .projects()
            .iter()
            .flat_map(|p| p.tasks.iter())
            .map(|t| t.id.as_str());
        resolve("task", prefix, ids)
    }

    pub fn subtask_id(&self, task_id: &str, prefix: &str) -> Result<String, String> {
        let ids = self
            .session
            .projects()
            .iter()
            .flat_map(|p| p.tasks.iter())
            .filter(|t| t.id == task_id)
            .flat_map(|t| t.subtasks.iter())
            .map(|s| s.id.as_str());
        resolve("subtask", prefix, ids)
    }
}

fn resolve<'a>(kind: &str, prefix: &str, ids: impl Iterator<Item = &'a str>) -> Result<String, String> {
    let mut matches = ids.filter(|id| id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        _ if prefix.is_empty() => Err(format!("empty {kind} id")),
        (Some(id), None) => Ok(id.to_string()),
        (None, _) => Err(format!("no {kind} matches '{prefix}'")),
        (Some(_), Some(_)) => Err(format!("{kind} id '{prefix}' is ambiguous")),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_events(events: &[Event]) -> CmdResult {
    for event in events {
        print_json(event)?;
    }
    Ok(())
}

/// `mm:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// First eight characters of an id, enough to type back in.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_by_unique_prefix() {
        let ids = ["abc123", "abd456", "xyz"];
        assert_eq!(resolve("task", "abc", ids.iter().copied()), Ok("abc123".to_string()));
        assert_eq!(resolve("task", "xyz", ids.iter().copied()), Ok("xyz".to_string()));
        assert!(resolve("task", "ab", ids.iter().copied()).unwrap_err().contains("ambiguous"));
        assert!(resolve("task", "q", ids.iter().copied()).unwrap_err().contains("no task"));
        assert!(resolve("task", "", ids.iter().copied()).is_err());
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn short_id_handles_short_input() {
        assert_eq!(short_id("0123456789"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
