use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
};
use shamba_core::{AnalysisResult, ImageInput};
use shamba_oracle::GenerativeBackend;
use tracing::info;

use super::error::ApiError;
use super::models::{ApiResponse, ReportRequest, ReportResponse, ScanRequest};
use crate::{ClimateOutlook, SessionHandle, SweepReport};

fn image_from_request(headers: &HeaderMap, body: Bytes) -> ImageInput {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim())
        .unwrap_or_default();
    ImageInput::new(body.to_vec(), mime_type)
}

pub async fn analyze_crop<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<AnalysisResult>>, ApiError> {
    let image = image_from_request(&headers, body);
    info!(bytes = image.bytes.len(), mime = %image.mime_type, "Crop image submitted");
    let result = session.oracle().analyze_crop_image(&image).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn analyze_soil<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<AnalysisResult>>, ApiError> {
    let image = image_from_request(&headers, body);
    info!(bytes = image.bytes.len(), mime = %image.mime_type, "Soil image submitted");
    let result = session.oracle().analyze_soil_image(&image).await?;
    Ok(Json(ApiResponse::ok(result)))
}

pub async fn strategic_report<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ApiResponse<ReportResponse>>, ApiError> {
    let plan = session.plan();
    if !plan.allows_strategic_report() {
        return Err(ApiError::Forbidden(format!(
            "strategic reports are not included in the {plan} plan"
        )));
    }

    let report = session
        .oracle()
        .generate_strategic_report(&request.context)
        .await?;
    Ok(Json(ApiResponse::ok(ReportResponse { report })))
}

pub async fn security_scan<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
    body: Bytes,
) -> Result<Json<ApiResponse<SweepReport>>, ApiError> {
    // An empty body scans the default source.
    let request = if body.is_empty() {
        ScanRequest::default()
    } else {
        serde_json::from_slice::<ScanRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid scan request: {e}")))?
    };
    let report = session.scan(request.source).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn threat<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
) -> Json<ApiResponse<Option<SweepReport>>> {
    Json(ApiResponse::ok(session.state().threat().await))
}

pub async fn climate<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
) -> Json<ApiResponse<Option<ClimateOutlook>>> {
    Json(ApiResponse::ok(session.state().climate().await))
}

pub async fn refresh_climate<B: GenerativeBackend>(
    State(session): State<SessionHandle<B>>,
) -> Result<Json<ApiResponse<ClimateOutlook>>, ApiError> {
    let climate = session.refresh_climate().await?;
    Ok(Json(ApiResponse::ok(climate)))
}
