use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shamba_oracle::OracleError;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    /// The generative-AI service failed or answered with garbage.
    BadGateway { message: String, error: String },
    /// The session is shutting down.
    Unavailable(String),
}

impl From<OracleError> for ApiError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::InvalidInput(msg) => ApiError::BadRequest(msg),
            OracleError::Cancelled => ApiError::Unavailable("session is shutting down".into()),
            other @ (OracleError::Transient(_)
            | OracleError::Fatal(_)
            | OracleError::Malformed(_)) => {
                warn!(error = %other, "Oracle call failed");
                ApiError::BadGateway {
                    message: "AI service request failed".into(),
                    error: other.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadGateway { message, error } => {
                (StatusCode::BAD_GATEWAY, message, Some(error))
            }
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
        };

        let body = ErrorResponse {
            success: false,
            message,
            error,
        };

        (status, Json(body)).into_response()
    }
}
