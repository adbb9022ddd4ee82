use std::time::Duration;

use shamba_core::AuditSource;
use shamba_oracle::{GenerativeBackend, OracleError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::SessionHandle;

/// Periodic threat sweep. The first sweep runs immediately.
pub async fn run<B: GenerativeBackend>(
    session: SessionHandle<B>,
    source: AuditSource,
    period: Duration,
    cancel: CancellationToken,
) {
    info!(
        ?source,
        interval_secs = period.as_secs(),
        "Threat sweep started"
    );

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Threat sweep shutting down");
                break;
            }
            _ = interval.tick() => {
                match session.scan(source).await {
                    Ok(_) => {}
                    Err(OracleError::Cancelled) => {
                        info!("Threat sweep cancelled mid-call");
                        break;
                    }
                    // The previous assessment stays in place until a sweep succeeds.
                    Err(e) => warn!(error = %e, ?source, "Threat sweep failed"),
                }
            }
        }
    }
}
