use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::Fleet;

/// Lifecycle of the telemetry generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// No timer running.
    Idle,
    /// Timer running, fleet advanced every interval.
    Ticking,
}

/// Drives a [`Fleet`] forward on a fixed interval.
#[derive(Clone)]
pub struct TelemetryGenerator {
    fleet: Fleet,
    interval: Duration,
}

impl TelemetryGenerator {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
    /// Shortest accepted tick period; shorter intervals are raised to it.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn new(fleet: Fleet, interval: Duration) -> Self {
        Self {
            fleet,
            interval: interval.max(Self::MIN_INTERVAL),
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start ticking.
    ///
    /// The first tick happens one interval from now. The returned [`Ticker`]
    /// owns the background task; ticking stops when it is stopped, dropped,
    /// or when `parent` is cancelled.
    pub fn start(&self, parent: &CancellationToken) -> Ticker {
        let cancel = parent.child_token();
        let fleet = self.fleet.clone();
        let period = self.interval;

        info!(
            sensor_count = fleet.len(),
            interval_ms = period.as_millis() as u64,
            "Starting telemetry generator"
        );

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        info!("Telemetry generator shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let snapshot = fleet.advance();
                        debug!(
                            tick = snapshot.tick,
                            mesh_latency_ms = snapshot.mesh_latency_ms,
                            "Fleet advanced"
                        );
                    }
                }
            }
        });

        Ticker {
            cancel,
            handle: Some(handle),
        }
    }
}

/// Handle to a running telemetry generator.
///
/// Dropping the handle cancels the background task. Use [`Ticker::stop`] to
/// also wait until it has exited.
pub struct Ticker {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn state(&self) -> GeneratorState {
        match &self.handle {
            Some(handle) if !handle.is_finished() && !self.cancel.is_cancelled() => {
                GeneratorState::Ticking
            }
            _ => GeneratorState::Idle,
        }
    }

    /// Stop ticking and wait for the task to exit. No tick is applied after
    /// this returns.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = ?e, "Telemetry generator task failed");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
