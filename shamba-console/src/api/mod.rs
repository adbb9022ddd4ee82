pub mod error;
pub mod intel;
pub mod models;
pub mod telemetry;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use shamba_oracle::GenerativeBackend;

use crate::SessionHandle;

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router<B: GenerativeBackend>(session: SessionHandle<B>) -> Router {
    let api = Router::new()
        // Telemetry routes
        .route("/sensors", get(telemetry::list_sensors::<B>))
        .route("/sensors/{id}/history", get(telemetry::sensor_history::<B>))
        .route("/fleet/summary", get(telemetry::fleet_summary::<B>))
        // Oracle routes
        .route("/analyze/crop", post(intel::analyze_crop::<B>))
        .route("/analyze/soil", post(intel::analyze_soil::<B>))
        .route("/report", post(intel::strategic_report::<B>))
        .route("/security/scan", post(intel::security_scan::<B>))
        .route("/threat", get(intel::threat::<B>))
        .route("/climate", get(intel::climate::<B>))
        .route("/climate/refresh", post(intel::refresh_climate::<B>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(session)
}

async fn health() -> &'static str {
    "OK"
}
