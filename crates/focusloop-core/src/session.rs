//! Session controller.
//!
//! Owns the project list, the active project/task references and the timer
//! engine. The timer never sees tasks and the board never sees the timer:
//! the controller routes timer completion events into budget updates and
//! detaches the focus session when its task leaves play.
//!
//! The controller does no I/O. Mutations stamp a change time that
//! [`SessionController::sync_store`] hands to a [`ProjectStore`] for
//! debounced saving.

use std::sync::Arc;

use crate::board::{column_index, compute_new_order, Project, Subtask, Task, TaskStatus};
use crate::error::{SessionError, StorageError};
use crate::events::Event;
use crate::storage::{KvBackend, ProjectStore, SessionSnapshot};
use crate::timer::{
    Clock, HapticPatterns, HapticSink, SystemClock, TickLease, TickTarget, TimerDurations,
    TimerEngine,
};

type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug)]
pub struct SessionController {
    projects: Vec<Project>,
    active_project_id: Option<String>,
    active_task_id: Option<String>,
    timer: TimerEngine,
    clock: Arc<dyn Clock>,
    /// Time of the last board mutation not yet handed to a store.
    changed_at: Option<u64>,
}

impl SessionController {
    pub fn new(projects: Vec<Project>, durations: TimerDurations) -> Self {
        Self::with_clock(projects, durations, Arc::new(SystemClock))
    }

    /// The first project becomes active, as on a fresh start.
    pub fn with_clock(projects: Vec<Project>, durations: TimerDurations, clock: Arc<dyn Clock>) -> Self {
        let active_project_id = projects.first().map(|p| p.id.clone());
        Self {
            projects,
            active_project_id,
            active_task_id: None,
            timer: TimerEngine::with_clock(durations, clock.clone()),
            clock,
            changed_at: None,
        }
    }

    /// Rebuild from a store: the board document plus the session snapshot.
    /// References to projects or tasks that no longer exist are dropped.
    pub fn restore<B: KvBackend>(
        store: &ProjectStore<B>,
        durations: TimerDurations,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut controller = Self::with_clock(store.load_projects(), durations, clock.clone());
        let snapshot = store.load_session();

        if let Some(id) = snapshot.active_project_id {
            if controller.project(&id).is_some() {
                controller.active_project_id = Some(id);
            }
        }
        controller.active_task_id = snapshot
            .active_task_id
            .filter(|id| controller.find_task(id).is_some());
        if let Some(state) = snapshot.timer {
            controller.timer = TimerEngine::restore(state, durations, clock);
        }
        controller
    }

    pub fn with_haptics(mut self, sink: Arc<dyn HapticSink>, patterns: HapticPatterns) -> Self {
        self.timer = self.timer.with_haptics(sink, patterns);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.active_project_id.as_deref().and_then(|id| self.project(id))
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active_project_id.as_deref()
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.active_task_id.as_deref()
    }

    /// The task attached to the focus session, searched across all projects.
    pub fn active_task(&self) -> Option<&Task> {
        self.active_task_id.as_deref().and_then(|id| self.find_task(id))
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_project_id: self.active_project_id.clone(),
            active_task_id: self.active_task_id.clone(),
            timer: Some(self.timer.state().clone()),
        }
    }

    // ── Projects ─────────────────────────────────────────────────────

    /// Create a project and make it active. Returns its id.
    pub fn create_project(&mut self, title: &str, days: i64, hours: i64) -> Result<String> {
        let title = non_blank(title)?;
        let project = Project::new(title, days, hours);
        let id = project.id.clone();
        tracing::info!(project_id = %id, budget_minutes = project.total_time_minutes, "project created");
        self.projects.push(project);
        self.active_project_id = Some(id.clone());
        self.touch();
        Ok(id)
    }

    /// Delete a project. If it was active, the first remaining project
    /// becomes active. A focus session on one of its tasks is detached.
    pub fn delete_project(&mut self, project_id: &str) -> Result<Vec<Event>> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| SessionError::ProjectNotFound(project_id.to_string()))?;
        let removed = self.projects.remove(index);

        let owned_focus = self
            .active_task_id
            .as_deref()
            .is_some_and(|id| removed.task(id).is_some());
        let events = if owned_focus { self.detach_focus() } else { Vec::new() };
        if self.active_project_id.as_deref() == Some(project_id) {
            self.active_project_id = self.projects.first().map(|p| p.id.clone());
        }
        self.touch();
        Ok(events)
    }

    pub fn select_project(&mut self, project_id: &str) -> Result<()> {
        if self.project(project_id).is_none() {
            return Err(SessionError::ProjectNotFound(project_id.to_string()));
        }
        self.active_project_id = Some(project_id.to_string());
        Ok(())
    }

    /// Credit minutes to the active project. Non-positive input is ignored.
    pub fn add_time_budget(&mut self, minutes: i64) -> Result<Option<Event>> {
        let project_id = self
            .active_project_id
            .clone()
            .ok_or(SessionError::NoActiveProject)?;
        if minutes <= 0 {
            return Ok(None);
        }
        Ok(self.credit(&project_id, minutes as u64))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    /// Append a `todo` task to the active project. Returns its id.
    pub fn add_task(&mut self, title: &str) -> Result<String> {
        let title = non_blank(title)?;
        let task = Task::new(title, self.clock.now_ms());
        let id = task.id.clone();
        self.active_project_mut()?.tasks.push(task);
        self.touch();
        Ok(id)
    }

    /// Change a task's status in place, without moving it in the list.
    pub fn update_task_status(&mut self, task_id: &str, status: TaskStatus) -> Result<Vec<Event>> {
        self.active_task_mut_in_project(task_id)?.status = status;
        self.touch();
        Ok(self.detach_if_done(task_id, status))
    }

    /// Delete a task and its subtasks.
    pub fn delete_task(&mut self, task_id: &str) -> Result<Vec<Event>> {
        let project = self.active_project_mut()?;
        let before = project.tasks.len();
        project.tasks.retain(|t| t.id != task_id);
        if project.tasks.len() == before {
            return Err(SessionError::TaskNotFound(task_id.to_string()));
        }
        self.touch();
        if self.active_task_id.as_deref() == Some(task_id) {
            return Ok(self.detach_focus());
        }
        Ok(Vec::new())
    }

    /// Drop a task into `new_status` at `target_index` of that column.
    ///
    /// Unknown tasks are ignored. See [`compute_new_order`] for the index
    /// contract.
    pub fn move_task(&mut self, task_id: &str, new_status: TaskStatus, target_index: i64) -> Result<Vec<Event>> {
        let at = self.clock.now_utc();
        let project = self.active_project_mut()?;
        if project.task(task_id).is_none() {
            tracing::debug!(task_id, "move of unknown task ignored");
            return Ok(Vec::new());
        }
        project.tasks = compute_new_order(&project.tasks, task_id, new_status, target_index);
        let column_index = column_index(&project.tasks, task_id).unwrap_or_default();
        self.touch();

        let mut events = vec![Event::TaskMoved {
            task_id: task_id.to_string(),
            status: new_status,
            column_index,
            at,
        }];
        events.extend(self.detach_if_done(task_id, new_status));
        Ok(events)
    }

    // ── Subtasks ─────────────────────────────────────────────────────

    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<String> {
        let title = non_blank(title)?;
        let subtask = Subtask::new(title);
        let id = subtask.id.clone();
        self.active_task_mut_in_project(task_id)?.subtasks.push(subtask);
        self.touch();
        Ok(id)
    }

    /// Flip a subtask's completed flag. Returns the new value.
    ///
    /// Works on any project so the focused task's checklist can be ticked
    /// off while another project is on screen.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool> {
        let task = self
            .projects
            .iter_mut()
            .flat_map(|p| p.tasks.iter_mut())
            .find(|t| t.id == task_id)
            .ok_or_else(|| SessionError::TaskNotFound(task_id.to_string()))?;
        let subtask = task
            .subtask_mut(subtask_id)
            .ok_or_else(|| SessionError::SubtaskNotFound {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            })?;
        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        self.touch();
        Ok(completed)
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<()> {
        let task = self.active_task_mut_in_project(task_id)?;
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask_id);
        if task.subtasks.len() == before {
            return Err(SessionError::SubtaskNotFound {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            });
        }
        self.touch();
        Ok(())
    }

    // ── Focus session ────────────────────────────────────────────────

    /// Attach the focus session to `task_id`.
    ///
    /// Only one task can hold the session. While the timer runs for another
    /// task this is refused; otherwise the previous task is detached and the
    /// timer starts over from a fresh work interval. The task's project
    /// becomes active.
    pub fn start_focus(&mut self, task_id: &str) -> Result<Vec<Event>> {
        let project_id = self
            .projects
            .iter()
            .find(|p| p.task(task_id).is_some())
            .map(|p| p.id.clone())
            .ok_or_else(|| SessionError::TaskNotFound(task_id.to_string()))?;

        if self.active_task_id.as_deref() == Some(task_id) {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        if let Some(current) = self.active_task_id.clone() {
            if self.timer.is_active() {
                return Err(SessionError::FocusBusy(current));
            }
            events.extend(self.detach_focus());
        }

        self.active_project_id = Some(project_id);
        self.active_task_id = Some(task_id.to_string());
        tracing::info!(task_id, "focus started");
        events.push(Event::FocusStarted {
            task_id: task_id.to_string(),
            at: self.clock.now_utc(),
        });
        Ok(events)
    }

    /// Detach the focus session from its task, resetting the timer.
    pub fn clear_active_task(&mut self) -> Vec<Event> {
        self.detach_focus()
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_timer(&mut self) -> Option<Event> {
        self.timer.start()
    }

    pub fn pause_timer(&mut self) -> Option<Event> {
        self.timer.pause()
    }

    pub fn toggle_timer(&mut self) -> Option<Event> {
        self.timer.toggle()
    }

    pub fn reset_timer(&mut self, auto_start: bool) -> Option<Event> {
        self.timer.reset(auto_start)
    }

    /// Tick the timer and route whatever it emits.
    pub fn tick(&mut self) -> Vec<Event> {
        match self.timer.tick() {
            Some(event) => self.handle_timer_event(event),
            None => Vec::new(),
        }
    }

    /// Route a timer event. Returns the event followed by anything it caused.
    ///
    /// A completed work interval is credited to the project that owns the
    /// focused task, or to the active project when no task is attached.
    pub fn handle_timer_event(&mut self, event: Event) -> Vec<Event> {
        let mut events = Vec::new();
        match &event {
            Event::SessionCompleted { minutes, .. } => {
                let target = self
                    .active_task_id
                    .as_deref()
                    .and_then(|task_id| self.projects.iter().find(|p| p.task(task_id).is_some()))
                    .map(|p| p.id.clone())
                    .or_else(|| self.active_project_id.clone());
                match target {
                    Some(project_id) => events.extend(self.credit(&project_id, *minutes)),
                    None => tracing::warn!(minutes, "completed session has no project to credit"),
                }
            }
            Event::SequenceCompleted { .. } => {
                tracing::debug!(task_id = ?self.active_task_id, "sequence completed");
            }
            _ => {}
        }
        events.insert(0, event);
        events
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Hand pending changes to `store` and save if its quiet period elapsed.
    /// Returns whether a write happened.
    pub fn sync_store<B: KvBackend>(&mut self, store: &mut ProjectStore<B>) -> std::result::Result<bool, StorageError> {
        if let Some(at) = self.changed_at.take() {
            store.mark_dirty(at);
        }
        store.flush_due(self.clock.now_ms(), &self.projects)
    }

    /// Save the board and session immediately (shutdown path).
    pub fn save_now<B: KvBackend>(&mut self, store: &mut ProjectStore<B>) -> std::result::Result<(), StorageError> {
        self.changed_at = None;
        store.flush(&self.projects)?;
        store.save_session(&self.snapshot())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn touch(&mut self) {
        self.changed_at = Some(self.clock.now_ms());
    }

    fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.projects.iter().find_map(|p| p.task(task_id))
    }

    fn active_project_mut(&mut self) -> Result<&mut Project> {
        let id = self
            .active_project_id
            .as_deref()
            .ok_or(SessionError::NoActiveProject)?;
        self.projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SessionError::NoActiveProject)
    }

    fn active_task_mut_in_project(&mut self, task_id: &str) -> Result<&mut Task> {
        self.active_project_mut()?
            .task_mut(task_id)
            .ok_or_else(|| SessionError::TaskNotFound(task_id.to_string()))
    }

    fn credit(&mut self, project_id: &str, minutes: u64) -> Option<Event> {
        let at = self.clock.now_utc();
        let project = self.projects.iter_mut().find(|p| p.id == project_id)?;
        project.time_spent_minutes = project.time_spent_minutes.saturating_add(minutes);
        let time_spent_minutes = project.time_spent_minutes;
        tracing::info!(project_id, minutes, time_spent_minutes, "time budget updated");
        self.touch();
        Some(Event::BudgetUpdated {
            project_id: project_id.to_string(),
            added_minutes: minutes,
            time_spent_minutes,
            at,
        })
    }

    fn detach_if_done(&mut self, task_id: &str, status: TaskStatus) -> Vec<Event> {
        if status == TaskStatus::Done && self.active_task_id.as_deref() == Some(task_id) {
            self.detach_focus()
        } else {
            Vec::new()
        }
    }

    fn detach_focus(&mut self) -> Vec<Event> {
        let Some(task_id) = self.active_task_id.take() else {
            return Vec::new();
        };
        tracing::info!(task_id = %task_id, "focus session detached");
        let mut events: Vec<Event> = self.timer.reset(false).into_iter().collect();
        events.push(Event::FocusCleared {
            task_id,
            at: self.clock.now_utc(),
        });
        events
    }
}

impl TickTarget for SessionController {
    fn lease(&self) -> Option<TickLease> {
        self.timer.lease()
    }

    fn tick_leased(&mut self, lease: TickLease) -> Option<Vec<Event>> {
        if !self.timer.is_current(lease) {
            return None;
        }
        Some(self.tick())
    }
}

fn non_blank(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(SessionError::EmptyTitle)
    } else {
        Ok(trimmed)
    }
}
