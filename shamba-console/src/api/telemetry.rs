use axum::{
    Json,
    extract::{Path, Query, State},
};
use shamba_oracle::GenerativeBackend;
use shamba_telemetry::{FleetSnapshot, FleetSummary, history_series};

use super::error::ApiError;
use super::models::{ApiResponse, HistoryQuery, HistoryResponse};
use crate::SessionHandle;

pub async fn list_sensors<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
) -> Json<ApiResponse<FleetSnapshot>> {
    let snapshot = session.fleet().snapshot();
    Json(ApiResponse::ok(FleetSnapshot::clone(&snapshot)))
}

pub async fn sensor_history<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryResponse>>, ApiError> {
    let reading = session
        .fleet()
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("sensor {id} not found")))?;

    let points = history_series(reading.kind, reading.value, query.range);

    Ok(Json(ApiResponse::ok(HistoryResponse {
        unit: reading.unit(),
        id: reading.id,
        kind: reading.kind,
        range: query.range,
        points,
    })))
}

pub async fn fleet_summary<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
) -> Json<ApiResponse<FleetSummary>> {
    Json(ApiResponse::ok(session.summary()))
}
