use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::jobs::dispatcher::DispatchError;
use crate::models::job::JobId;
use crate::store::StoreError;

/// Message returned for ids with no live record.
pub const JOB_NOT_FOUND_MESSAGE: &str = "Job ID not found or expired";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Store(e) => AppError::Store(e),
            e @ (DispatchError::QueueFull | DispatchError::ShuttingDown) => {
                AppError::Unavailable(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Pollers rely on this exact body; it does not use the error envelope.
            AppError::JobNotFound(_) => {
                let body = Json(json!({
                    "status": "not_found",
                    "error": JOB_NOT_FOUND_MESSAGE
                }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    msg.clone(),
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
