use serde::{Deserialize, Serialize};
use shamba_core::{AuditSource, MetricUnit, SensorId, SensorKind};
use shamba_telemetry::{HistoryPoint, HistoryWindow};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub range: HistoryWindow,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub id: SensorId,
    pub kind: SensorKind,
    pub unit: MetricUnit,
    pub range: HistoryWindow,
    pub points: Vec<HistoryPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub source: AuditSource,
}
