use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use serde::Serialize;
use shamba_core::{AuditSource, Percentage, PlanTier, Position, ThreatAssessment};
use shamba_oracle::{GenerativeBackend, OracleClient, OracleError};
use shamba_telemetry::{Fleet, FleetSummary, GeneratorState, TelemetryGenerator, Ticker};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::Config;
use crate::sentinel;

/// Result of one security-log assessment.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub source: AuditSource,
    pub assessment: ThreatAssessment,
    pub assessed_at: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClimateOutlook {
    pub position: Position,
    pub outlook: String,
    pub fetched_at: Timestamp,
}

/// Latest oracle results kept for the lifetime of a session.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    threat: Option<SweepReport>,
    climate: Option<ClimateOutlook>,
}

impl SessionState {
    pub async fn threat(&self) -> Option<SweepReport> {
        self.inner.lock().await.threat.clone()
    }

    pub async fn climate(&self) -> Option<ClimateOutlook> {
        self.inner.lock().await.climate.clone()
    }

    async fn set_threat(&self, report: SweepReport) {
        self.inner.lock().await.threat = Some(report);
    }

    async fn set_climate(&self, climate: ClimateOutlook) {
        self.inner.lock().await.climate = Some(climate);
    }
}

/// Cheap, cloneable access to a running session.
///
/// Handed to the HTTP layer and to the background tasks. Oracle calls made
/// through it are cancelled when the session ends.
pub struct SessionHandle<B> {
    fleet: Fleet,
    oracle: OracleClient<B>,
    state: SessionState,
    plan: PlanTier,
    location: Position,
    battery_threshold: Percentage,
}

impl<B> Clone for SessionHandle<B> {
    fn clone(&self) -> Self {
        Self {
            fleet: self.fleet.clone(),
            oracle: self.oracle.clone(),
            state: self.state.clone(),
            plan: self.plan,
            location: self.location,
            battery_threshold: self.battery_threshold,
        }
    }
}

impl<B: GenerativeBackend> SessionHandle<B> {
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn oracle(&self) -> &OracleClient<B> {
        &self.oracle
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn plan(&self) -> PlanTier {
        self.plan
    }

    pub fn location(&self) -> Position {
        self.location
    }

    pub fn summary(&self) -> FleetSummary {
        self.fleet.summary(self.battery_threshold)
    }

    /// Assess one audit log source and remember the result.
    pub async fn scan(&self, source: AuditSource) -> Result<SweepReport, OracleError> {
        let entries = source.entries();
        let assessment = self.oracle.assess_security_logs(&entries).await?;
        let report = SweepReport {
            source,
            assessment,
            assessed_at: Timestamp::now(),
        };
        info!(
            ?source,
            threat_level = %report.assessment.threat_level,
            "Threat assessment updated"
        );
        self.state.set_threat(report.clone()).await;
        Ok(report)
    }

    /// Fetch a fresh climate outlook for the session location.
    pub async fn refresh_climate(&self) -> Result<ClimateOutlook, OracleError> {
        let outlook = self.oracle.climate_outlook(self.location).await?;
        let climate = ClimateOutlook {
            position: self.location,
            outlook,
            fetched_at: Timestamp::now(),
        };
        info!(lat = self.location.lat, lng = self.location.lng, "Climate outlook updated");
        self.state.set_climate(climate.clone()).await;
        Ok(climate)
    }
}

/// An active console session.
///
/// Owns the telemetry ticker, the threat sweep and the initial climate
/// fetch. [`Session::end`] stops all of them and waits for them to exit;
/// dropping the session only cancels them.
pub struct Session<B> {
    handle: SessionHandle<B>,
    cancel: CancellationToken,
    ticker: Option<Ticker>,
    tasks: Vec<JoinHandle<()>>,
}

impl<B: GenerativeBackend> Session<B> {
    /// Seed the fleet and start the background work. Must be called from
    /// within a tokio runtime.
    pub fn start(config: &Config, oracle: OracleClient<B>) -> Self {
        let cancel = CancellationToken::new();
        let fleet = Fleet::seeded();

        let handle = SessionHandle {
            fleet: fleet.clone(),
            oracle: oracle.with_cancellation(cancel.clone()),
            state: SessionState::default(),
            plan: config.session.plan,
            location: config.session.location(),
            battery_threshold: config.session.battery_threshold(),
        };

        info!(
            plan = %handle.plan,
            sensors = fleet.len(),
            "Starting session"
        );

        let ticker =
            TelemetryGenerator::new(fleet, config.telemetry.tick_interval()).start(&cancel);

        let mut tasks = Vec::new();

        if handle.plan.allows_threat_sweep() {
            let sweep_handle = handle.clone();
            let sweep_cancel = cancel.clone();
            let source = config.sentinel.source;
            let interval = config.sentinel.sweep_interval();
            tasks.push(tokio::spawn(async move {
                sentinel::run(sweep_handle, source, interval, sweep_cancel).await;
            }));
        } else {
            info!(plan = %handle.plan, "Threat sweep not included in plan");
        }

        let climate_handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            match climate_handle.refresh_climate().await {
                Ok(_) | Err(OracleError::Cancelled) => {}
                Err(e) => warn!(error = %e, "Initial climate outlook failed"),
            }
        }));

        Self {
            handle,
            cancel,
            ticker: Some(ticker),
            tasks,
        }
    }

    pub fn handle(&self) -> SessionHandle<B> {
        self.handle.clone()
    }

    pub fn telemetry_state(&self) -> GeneratorState {
        self.ticker
            .as_ref()
            .map_or(GeneratorState::Idle, Ticker::state)
    }

    /// Cancel every background task and in-flight oracle call, then wait
    /// until they have exited.
    pub async fn end(mut self) {
        info!("Ending session");
        self.cancel.cancel();

        if let Some(ticker) = self.ticker.take() {
            ticker.stop().await;
        }

        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                error!(error = ?e, "Session task failed");
            }
        }

        info!("Session ended");
    }

    /// Wait at most `grace` for [`Session::end`] to finish.
    pub async fn end_within(self, grace: Duration) {
        if tokio::time::timeout(grace, self.end()).await.is_err() {
            warn!(grace_ms = grace.as_millis() as u64, "Session did not end in time");
        }
    }
}

impl<B> Drop for Session<B> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
