use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The completion service failed or returned an error status.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timed out after {0}s")]
    UpstreamTimeout(u64),

    /// Generation finished but the description could not be saved.
    #[error("Write error: {0}")]
    Persistence(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) | AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code, shared by JSON error bodies and SSE error events.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Persistence(_) => "WRITE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to API clients. Server-side failures are logged here
    /// and replaced with a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                "The text generation service failed".to_string()
            }
            AppError::UpstreamTimeout(secs) => {
                tracing::error!("Upstream timed out after {secs}s");
                "The text generation service did not respond in time".to_string()
            }
            AppError::Persistence(msg) => {
                tracing::error!("Write error: {msg}");
                "The description was generated but could not be saved".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout { after } => AppError::UpstreamTimeout(after.as_secs()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_llm_timeout_maps_to_upstream_timeout() {
        let err: AppError = LlmError::Timeout {
            after: Duration::from_secs(30),
        }
        .into();
        assert!(matches!(err, AppError::UpstreamTimeout(30)));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_llm_api_error_maps_to_upstream_error() {
        let err: AppError = LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_message_is_passed_through() {
        let err = AppError::NotFound("Job posting 7 not found".to_string());
        assert_eq!(err.public_message(), "Job posting 7 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_persistence_message_hides_details() {
        let err = AppError::Persistence("connection reset".to_string());
        assert!(!err.public_message().contains("connection reset"));
        assert_eq!(err.code(), "WRITE_ERROR");
    }
}
