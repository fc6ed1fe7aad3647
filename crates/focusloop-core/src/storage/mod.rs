mod config;
pub mod database;
mod project_store;

pub use config::{Config, HapticsConfig, StorageConfig, TimerConfig};
pub use database::Database;
pub use project_store::{
    KvBackend, MemoryKv, ProjectStore, SavedData, SessionSnapshot, SESSION_KEY, STORAGE_KEY,
};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/focusloop[-dev]/` based on FOCUSLOOP_ENV.
///
/// Set FOCUSLOOP_ENV=dev to use development data directory.
/// FOCUSLOOP_DATA_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FOCUSLOOP_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSLOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusloop-dev")
            } else {
                base_dir.join("focusloop")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
