use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::{FailureReason, LlmError};
use crate::quotes::service::QuoteError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),
}

impl From<QuoteError> for AppError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::InvalidInput(e) => AppError::Validation(e.to_string()),
            QuoteError::Generation(e) => AppError::Generation(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            // Logged by the quote service with request context.
            AppError::Generation(e) => {
                let reason = e.reason();
                (generation_status(reason), reason.code(), generation_message(reason).to_string())
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

fn generation_status(reason: FailureReason) -> StatusCode {
    match reason {
        FailureReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureReason::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn generation_message(reason: FailureReason) -> &'static str {
    match reason {
        FailureReason::BackendUnavailable => "The quote generator is temporarily unavailable",
        FailureReason::Timeout => "Quote generation timed out",
        FailureReason::ContentBlocked => {
            "The generated content was blocked. Try a different topic or category"
        }
        FailureReason::Truncated => {
            "The generator stopped before producing a quote. Try a different topic or category"
        }
        FailureReason::EmptyResponse => "The generator returned an empty quote",
        FailureReason::MalformedResponse => "The generator returned an unreadable response",
        FailureReason::UnknownBackendError => "Failed to generate quote",
    }
}
