//! Cancellable recurring tick driver.
//!
//! A ticker is acquired when the timer enters `Running` and released when it
//! leaves it. Every tick re-checks its [`TickLease`] under the same lock the
//! pause/reset commands take, so a tick that was already scheduled when the
//! timer was paused or reset is dropped instead of mutating state. If the
//! timer is running again under a new epoch (`reset(true)`, or pause then
//! start) the ticker takes a fresh lease and carries on; it ends on its own
//! once the timer is no longer running.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::{TickLease, TimerEngine};
use crate::events::Event;

/// Something that owns a timer and can be ticked on its behalf.
pub trait TickTarget {
    fn lease(&self) -> Option<TickLease>;

    /// Tick under `lease`. `None` means the lease was revoked and the
    /// ticker must stop.
    fn tick_leased(&mut self, lease: TickLease) -> Option<Vec<Event>>;
}

impl TickTarget for TimerEngine {
    fn lease(&self) -> Option<TickLease> {
        TimerEngine::lease(self)
    }

    fn tick_leased(&mut self, lease: TickLease) -> Option<Vec<Event>> {
        if !self.is_current(lease) {
            return None;
        }
        Some(self.tick().into_iter().collect())
    }
}

/// Handle to a running ticker. Dropping it aborts the task.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop ticking now.
    pub fn cancel(self) {
        // Drop does the work.
    }

    /// Wait until the ticker stops on its own (timer no longer running).
    pub async fn finished(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a ticker for `target` on the current tokio runtime.
///
/// Returns `None` if the target is not running. `on_event` receives every
/// event a tick produces, outside the lock.
pub fn spawn_ticker<T, F>(
    target: Arc<Mutex<T>>,
    period: Duration,
    mut on_event: F,
) -> Option<TickerHandle>
where
    T: TickTarget + Send + 'static,
    F: FnMut(Event) + Send + 'static,
{
    let mut lease = target.lock().unwrap_or_else(PoisonError::into_inner).lease()?;
    let period = period.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let events = {
                let mut guard = target.lock().unwrap_or_else(PoisonError::into_inner);
                match guard.tick_leased(lease) {
                    Some(events) => Some(events),
                    // Stale tick: dropped. Follow the timer into its new run.
                    None => guard.lease().map(|next| {
                        tracing::debug!("ticker lease renewed for a new run");
                        lease = next;
                        Vec::new()
                    }),
                }
            };
            let Some(events) = events else {
                tracing::debug!("timer stopped running, ticker exiting");
                break;
            };
            for event in events {
                on_event(event);
            }
        }
    });

    Some(TickerHandle { task })
}
