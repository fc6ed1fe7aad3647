//! Persistence boundary for the project list.
//!
//! The whole board is one JSON document, `{ "projects": [...] }`, stored
//! under [`STORAGE_KEY`]. Writes are debounced: every mutation pushes the
//! save back, and the document is written once no mutation has happened for
//! `debounce_ms`. Reads never fail -- a missing or malformed document is an
//! empty board.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::Project;
use crate::error::StorageError;
use crate::timer::TimerState;

/// Key holding the serialized project list.
pub const STORAGE_KEY: &str = "focusloop_data_v3";
/// Key holding the active project/task and timer state between runs.
pub const SESSION_KEY: &str = "focusloop_session";

/// Durable string key-value storage.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory backend. Counts writes so debounce behaviour is observable.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut kv = Self::default();
        kv.entries.insert(key.to_string(), value.to_string());
        kv
    }

    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// On-disk shape of the board document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedData {
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// Controller state that lives outside the board document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub active_project_id: Option<String>,
    #[serde(default)]
    pub active_task_id: Option<String>,
    #[serde(default)]
    pub timer: Option<TimerState>,
}

#[derive(Debug)]
pub struct ProjectStore<B: KvBackend> {
    backend: B,
    debounce_ms: u64,
    /// Time of the last unsaved mutation.
    dirty_since: Option<u64>,
}

impl<B: KvBackend> ProjectStore<B> {
    pub fn new(backend: B, debounce_ms: u64) -> Self {
        Self {
            backend,
            debounce_ms,
            dirty_since: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the saved board. Absent or unreadable data is an empty list.
    pub fn load_projects(&self) -> Vec<Project> {
        let raw = match self.backend.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved projects");
                return Vec::new();
            }
        };
        match serde_json::from_str::<SavedData>(&raw) {
            Ok(data) => {
                tracing::debug!(projects = data.projects.len(), "loaded saved projects");
                data.projects
            }
            Err(e) => {
                tracing::warn!(error = %e, "saved projects are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Record a mutation at `now_ms`, restarting the quiet period.
    pub fn mark_dirty(&mut self, now_ms: u64) {
        self.dirty_since = Some(now_ms);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Save if the quiet period since the last mutation has elapsed.
    /// Returns whether a write happened.
    pub fn flush_due(&mut self, now_ms: u64, projects: &[Project]) -> Result<bool, StorageError> {
        match self.dirty_since {
            Some(since) if now_ms.saturating_sub(since) >= self.debounce_ms => {
                self.flush(projects)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Save now, regardless of the debounce window.
    pub fn flush(&mut self, projects: &[Project]) -> Result<(), StorageError> {
        let data = SavedData {
            projects: projects.to_vec(),
        };
        let json = serde_json::to_string(&data).map_err(|source| StorageError::Encode {
            key: STORAGE_KEY.to_string(),
            source,
        })?;
        self.backend.set(STORAGE_KEY, &json)?;
        self.dirty_since = None;
        tracing::info!(projects = projects.len(), "projects saved");
        Ok(())
    }

    pub fn load_session(&self) -> SessionSnapshot {
        match self.backend.get(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "saved session is malformed, ignoring");
                SessionSnapshot::default()
            }),
            Ok(None) => SessionSnapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read saved session");
                SessionSnapshot::default()
            }
        }
    }

    pub fn save_session(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot).map_err(|source| StorageError::Encode {
            key: SESSION_KEY.to_string(),
            source,
        })?;
        self.backend.set(SESSION_KEY, &json)
    }
}
