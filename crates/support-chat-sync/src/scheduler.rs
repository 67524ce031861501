use crate::lock;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Active,
    Idle,
}

/// Fixed-interval timer that dispatches a task on every tick.
///
/// Each tick spawns the task independently, so a slow request never delays
/// the next tick. At most one timer is live per scheduler: starting again
/// cancels the previous one. Stopping prevents new dispatches only; tasks
/// already spawned run to completion.
#[derive(Debug)]
pub struct PollScheduler {
    name: &'static str,
    interval: Duration,
    cancel: Mutex<Option<CancellationToken>>,
}

impl PollScheduler {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            cancel: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking. With `eager`, the task is dispatched immediately and then
    /// once per interval; otherwise the first dispatch happens one interval
    /// from now. Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, eager: bool, task: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let previous = self.slot().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let name = self.name;
        let period = self.interval;
        tracing::debug!(scheduler = name, interval_ms = period.as_millis() as u64, eager, "timer started");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !eager {
                // Skip the first immediate tick.
                interval.tick().await;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!(scheduler = name, "timer stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        tokio::spawn(task());
                    }
                }
            }
        });
    }

    /// Cancel the live timer. Returns whether one was running.
    pub fn stop(&self) -> bool {
        match self.slot().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self.slot().as_ref() {
            Some(token) if !token.is_cancelled() => SchedulerState::Active,
            _ => SchedulerState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SchedulerState::Active
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        lock(&self.cancel)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
