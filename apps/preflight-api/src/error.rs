//! Error types for the Preflight API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use preflight_core::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Specification not found: {0}")]
    SpecNotFound(String),

    #[error("Validation result not found: {0}")]
    ResultNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::SpecNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Specification not found: {}", id))
            }
            ApiError::ResultNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Validation result not found: {}", id),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Engine(e) => (engine_status(e), e.to_string()),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::MissingFormatLine | EngineError::CorruptDocument(_) => StatusCode::BAD_REQUEST,
        EngineError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        EngineError::ConverterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::ConversionTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        EngineError::ConversionFailed(_)
        | EngineError::ConversionVerificationFailed
        | EngineError::ExtractionFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
