#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::drive::StoreError;
use crate::screening::extractor::ExtractError;
use crate::screening::pipeline::DocumentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported document format: {0}")]
    Unsupported(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("File store error: {0}")]
    Drive(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unsupported(format) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNSUPPORTED_FORMAT",
                format!("Unsupported file type: {format}"),
            ),
            AppError::Extraction(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                msg.clone(),
            ),
            AppError::Drive(msg) => {
                tracing::error!("Drive error: {msg}");
                (StatusCode::BAD_GATEWAY, "DRIVE_ERROR", msg.clone())
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Drive(err.to_string())
    }
}

/// Single-resume analysis has no batch to absorb failures into, so
/// document-scoped errors surface as typed HTTP responses.
impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Fetch(e) => AppError::Drive(e.to_string()),
            DocumentError::Extract(ExtractError::UnsupportedFormat(format)) => {
                AppError::Unsupported(format)
            }
            DocumentError::Extract(e) => AppError::Extraction(e.to_string()),
            DocumentError::Analyze(e) => AppError::Llm(e.to_string()),
        }
    }
}
