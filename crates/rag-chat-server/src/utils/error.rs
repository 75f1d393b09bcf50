use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single `respond` call
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Completion failed after {attempts} attempt(s): {reason}")]
    CompletionFailure { attempts: u32, reason: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Completion failure: {0}")]
    CompletionFailure(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError::CompletionFailure(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::InvalidInput(msg) => {
                tracing::warn!("Invalid input: {}", msg);
                (StatusCode::BAD_REQUEST, "InvalidInput", msg)
            },
            ApiError::CompletionFailure(msg) => {
                // provider details stay in the log
                tracing::error!("Completion failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CompletionFailure",
                    "The assistant is temporarily unavailable, please try again later".to_string(),
                )
            },
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "Internal server error".to_string(),
                )
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
