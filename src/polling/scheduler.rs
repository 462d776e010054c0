//! Polling scheduler.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PollingConfig;
use crate::session::machine::SessionStateMachine;
use crate::session::state::RefreshOutcome;

struct PollTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives `refresh_current()` on a fixed interval while started.
pub struct PollingScheduler {
    interval: Duration,
    task: Mutex<Option<PollTask>>,
}

impl PollingScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lock(&self) -> MutexGuard<'_, Option<PollTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start polling `machine`. Returns `false` if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, machine: SessionStateMachine) -> bool {
        let mut task = self.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return false;
        }

        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(poll_loop(machine, self.interval, stop_rx));
        *task = Some(PollTask { stop, handle });

        tracing::info!(interval = ?self.interval, "Balance polling started");
        true
    }

    /// Stop polling. Returns `false` if nothing was running.
    pub fn stop(&self) -> bool {
        let Some(task) = self.lock().take() else {
            return false;
        };

        let _ = task.stop.send(());
        // Also cancels a refresh that is mid-flight.
        task.handle.abort();
        tracing::info!("Balance polling stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|t| !t.handle.is_finished())
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn poll_loop(machine: SessionStateMachine, period: Duration, mut stop: oneshot::Receiver<()>) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = machine.refresh_current().await;
                if let RefreshOutcome::Failed(e) = outcome {
                    tracing::debug!(error = %e, "Poll refresh failed; retrying next tick");
                }
            }
            _ = &mut stop => {
                tracing::debug!("Polling task received stop signal, exiting loop");
                break;
            }
        }
    }
}
