use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::ApplicationError;

/// Capture cadence used when none is configured.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(100);

/// Runs a callback at a fixed cadence on the current tokio runtime.
pub struct CaptureScheduler {
    interval: Duration,
}

impl CaptureScheduler {
    pub fn new(interval: Duration) -> Result<Self, ApplicationError> {
        if interval.is_zero() {
            return Err(ApplicationError::InvalidInput(
                "capture interval must be non-zero".to_string(),
            ));
        }
        Ok(Self { interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The first call to `tick` happens one interval after start. Must be
    /// called from within a tokio runtime.
    pub fn start<F>(&self, mut tick: F) -> ScheduledCapture
    where
        F: FnMut() + Send + 'static,
    {
        let period = self.interval;
        let ticks = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                let mut ticker = time::interval_at(time::Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown_rx => break,
                        _ = ticker.tick() => {
                            ticks.fetch_add(1, Ordering::SeqCst);
                            tick();
                        }
                    }
                }
                debug!(ticks = ticks.load(Ordering::SeqCst), "capture scheduler stopped");
            }
        });

        ScheduledCapture {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            ticks,
        }
    }
}

/// Handle to a running scheduler. Dropping it cancels the timer as well.
pub struct ScheduledCapture {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl ScheduledCapture {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Resolves once the timer task has exited; no tick runs afterwards.
    pub async fn stop(mut self) -> Result<u64, ApplicationError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|error| ApplicationError::Task(error.to_string()))?;
        }
        Ok(self.ticks())
    }
}

impl Drop for ScheduledCapture {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
