//! # Focusloop Core Library
//!
//! Core logic for Focusloop, a Kanban board with a Pomodoro focus timer.
//! Every operation is available through the standalone `focusloop` CLI,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a work/break state machine driven by an absolute
//!   deadline. Remaining time is recomputed from the clock on every tick, so
//!   late or missed ticks never cause drift.
//! - **Board**: projects own an ordered task list; column order is derived
//!   from list order, and drag-and-drop placement is a pure function.
//! - **Session**: joins the two. Completed work intervals are credited to
//!   the focused task's project, and the focus session is detached when its
//!   task is finished or deleted.
//! - **Storage**: SQLite key-value persistence with debounced saves and
//!   TOML configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: timer state machine
//! - [`compute_new_order`]: board reorder engine
//! - [`SessionController`]: owner of the board and the focus session
//! - [`ProjectStore`]: debounced persistence boundary
//! - [`Config`]: application configuration management

pub mod board;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use board::{compute_new_order, BudgetUsage, MoveTarget, Project, Subtask, Task, TaskStatus};
pub use error::{ConfigError, CoreError, SessionError, StorageError};
pub use events::Event;
pub use session::SessionController;
pub use storage::{Config, Database, KvBackend, MemoryKv, ProjectStore, SessionSnapshot};
pub use timer::{
    spawn_ticker, Clock, HapticSink, ManualClock, SystemClock, TickerHandle, TimerDurations,
    TimerEngine, TimerMode, TimerPhase, TimerState,
};
