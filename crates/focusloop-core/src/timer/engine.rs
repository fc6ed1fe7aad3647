//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-deadline state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (see [`super::driver`] for a cancellable tokio ticker).
//!
//! While running, the countdown is always `ceil((deadline - now) / 1000)`.
//! Nothing is ever subtracted per tick, so missed, throttled or suspended
//! ticks cannot make the timer drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running ...
//!           |
//!           +-- work ran out  -> Running (break)
//!           +-- break ran out -> Paused (break, 0s) until reset
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerDurations::default());
//! engine.start();
//! // In a loop:
//! engine.tick(); // Returns Some(Event) when an interval completes
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use super::durations::TimerDurations;
use super::haptics::{HapticPatterns, HapticSink};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
}

/// Serializable timer state.
///
/// `deadline_ms` is an absolute epoch timestamp, so a persisted running
/// timer keeps counting correctly across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    pub remaining_secs: u64,
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Bumped on every transition into or out of `Running`.
    #[serde(default)]
    pub epoch: u64,
}

impl TimerState {
    fn idle(durations: &TimerDurations) -> Self {
        Self {
            mode: TimerMode::Work,
            phase: TimerPhase::Idle,
            remaining_secs: durations.work_secs,
            deadline_ms: None,
            epoch: 0,
        }
    }
}

/// Permission to tick a specific run of the timer.
///
/// Obtained while the timer is running. Any pause, reset or sequence
/// completion revokes every lease handed out before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickLease {
    epoch: u64,
}

/// Core timer engine.
pub struct TimerEngine {
    durations: TimerDurations,
    state: TimerState,
    clock: Arc<dyn Clock>,
    haptics: Option<Arc<dyn HapticSink>>,
    patterns: HapticPatterns,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("durations", &self.durations)
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("haptics", &self.haptics.is_some())
            .finish()
    }
}

impl TimerEngine {
    /// Create an idle engine on the system clock with the work duration loaded.
    pub fn new(durations: TimerDurations) -> Self {
        Self::with_clock(durations, Arc::new(SystemClock))
    }

    pub fn with_clock(durations: TimerDurations, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: TimerState::idle(&durations),
            durations,
            clock,
            haptics: None,
            patterns: HapticPatterns::default(),
        }
    }

    /// Rebuild an engine from a persisted state.
    ///
    /// A running state without a deadline cannot be resumed and is treated
    /// as paused.
    pub fn restore(state: TimerState, durations: TimerDurations, clock: Arc<dyn Clock>) -> Self {
        let mut engine = Self::with_clock(durations, clock);
        engine.state = state;
        if engine.state.phase == TimerPhase::Running && engine.state.deadline_ms.is_none() {
            engine.state.phase = TimerPhase::Paused;
        }
        if engine.state.phase != TimerPhase::Running {
            engine.state.deadline_ms = None;
        }
        engine
    }

    pub fn with_haptics(mut self, sink: Arc<dyn HapticSink>, patterns: HapticPatterns) -> Self {
        self.haptics = Some(sink);
        self.patterns = patterns;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn durations(&self) -> TimerDurations {
        self.durations
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.phase == TimerPhase::Running
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.state.deadline_ms
    }

    /// Seconds left as shown to the user.
    ///
    /// While running this is recomputed from the deadline; otherwise it is
    /// the frozen value.
    pub fn remaining_secs(&self) -> u64 {
        match (self.state.phase, self.state.deadline_ms) {
            (TimerPhase::Running, Some(deadline)) => secs_until(deadline, self.clock.now_ms()),
            _ => self.state.remaining_secs,
        }
    }

    /// Length of the interval for the current mode.
    pub fn total_secs(&self) -> u64 {
        match self.state.mode {
            TimerMode::Work => self.durations.work_secs,
            TimerMode::Break => self.durations.break_secs,
        }
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 1.0;
        }
        let remaining = self.remaining_secs().min(total);
        1.0 - (remaining as f64 / total as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            mode: self.state.mode,
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs(),
            progress: self.progress(),
            at: self.clock.now_utc(),
        }
    }

    /// A lease for the current run, if the timer is running.
    pub fn lease(&self) -> Option<TickLease> {
        self.is_active().then_some(TickLease {
            epoch: self.state.epoch,
        })
    }

    pub fn is_current(&self, lease: TickLease) -> bool {
        self.is_active() && lease.epoch == self.state.epoch
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state.phase {
            TimerPhase::Idle | TimerPhase::Paused => {
                let now = self.clock.now_ms();
                let deadline = deadline_after(now, self.state.remaining_secs);
                self.state.phase = TimerPhase::Running;
                self.state.deadline_ms = Some(deadline);
                self.state.epoch += 1;
                tracing::debug!(mode = ?self.state.mode, remaining_secs = self.state.remaining_secs, "timer started");
                Some(Event::TimerStarted {
                    mode: self.state.mode,
                    remaining_secs: self.state.remaining_secs,
                    deadline_ms: deadline,
                    at: self.clock.now_utc(),
                })
            }
            TimerPhase::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match (self.state.phase, self.state.deadline_ms) {
            (TimerPhase::Running, Some(deadline)) => {
                self.state.remaining_secs = secs_until(deadline, self.clock.now_ms());
                self.stop_running(TimerPhase::Paused);
                tracing::debug!(remaining_secs = self.state.remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    mode: self.state.mode,
                    remaining_secs: self.state.remaining_secs,
                    at: self.clock.now_utc(),
                })
            }
            _ => None,
        }
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.is_active() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to a fresh work interval. Revokes every outstanding lease.
    pub fn reset(&mut self, auto_start: bool) -> Option<Event> {
        self.stop_running(TimerPhase::Idle);
        self.state.mode = TimerMode::Work;
        self.state.remaining_secs = self.durations.work_secs;
        if auto_start {
            self.start();
        }
        tracing::debug!(auto_start, "timer reset");
        Some(Event::TimerReset {
            auto_start,
            at: self.clock.now_utc(),
        })
    }

    /// Call periodically. Returns `Some(Event::SessionCompleted)` or
    /// `Some(Event::SequenceCompleted)` when an interval finishes.
    ///
    /// The whole mode transition happens inside this call.
    pub fn tick(&mut self) -> Option<Event> {
        let deadline = match (self.state.phase, self.state.deadline_ms) {
            (TimerPhase::Running, Some(deadline)) => deadline,
            _ => return None,
        };
        let now = self.clock.now_ms();
        self.state.remaining_secs = secs_until(deadline, now);
        if self.state.remaining_secs > 0 {
            return None;
        }

        match self.state.mode {
            TimerMode::Work => {
                let minutes = self.durations.work_minutes();
                self.state.mode = TimerMode::Break;
                self.state.remaining_secs = self.durations.break_secs;
                self.state.deadline_ms = Some(deadline_after(now, self.durations.break_secs));
                self.vibrate(TimerMode::Work);
                tracing::info!(minutes, "work interval completed");
                Some(Event::SessionCompleted {
                    minutes,
                    at: self.clock.now_utc(),
                })
            }
            TimerMode::Break => {
                self.state.remaining_secs = 0;
                self.stop_running(TimerPhase::Paused);
                self.vibrate(TimerMode::Break);
                tracing::info!("focus sequence completed");
                Some(Event::SequenceCompleted {
                    at: self.clock.now_utc(),
                })
            }
        }
    }

    /// `tick()` on behalf of a scheduled callback. Does nothing if the lease
    /// was revoked by a pause, reset or sequence completion.
    pub fn tick_leased(&mut self, lease: TickLease) -> Option<Event> {
        if !self.is_current(lease) {
            tracing::trace!(lease = lease.epoch, current = self.state.epoch, "stale tick dropped");
            return None;
        }
        self.tick()
    }

    /// Swap interval lengths. The engine goes back to an idle work interval.
    pub fn set_durations(&mut self, durations: TimerDurations) {
        self.durations = durations;
        self.reset(false);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn stop_running(&mut self, phase: TimerPhase) {
        if self.state.phase == TimerPhase::Running {
            self.state.epoch += 1;
        }
        self.state.phase = phase;
        self.state.deadline_ms = None;
    }

    fn vibrate(&self, completed: TimerMode) {
        let Some(sink) = &self.haptics else {
            return;
        };
        let pattern = match completed {
            TimerMode::Work => &self.patterns.work_complete,
            TimerMode::Break => &self.patterns.sequence_complete,
        };
        sink.vibrate(pattern);
    }
}

/// `max(0, ceil((deadline - now) / 1000))`
fn secs_until(deadline_ms: u64, now_ms: u64) -> u64 {
    deadline_ms.saturating_sub(now_ms).div_ceil(1000)
}

fn deadline_after(now_ms: u64, secs: u64) -> u64 {
    now_ms.saturating_add(secs.saturating_mul(1000))
}
