//! Mapping from crate errors to HTTP responses

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::warn;

use crate::api::types::ErrorBody;
use crate::llm::LlmError;
use crate::PostRagError;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const RATE_LIMITED_MESSAGE: &str =
    "The AI service is receiving too many requests. Please try again in a moment.";
pub const INVALID_KEY_MESSAGE: &str = "The AI service is misconfigured (invalid API key).";
pub const CONTENT_BLOCKED_MESSAGE: &str =
    "This question could not be answered because it was blocked by content safety filters.";
pub const UNKNOWN_MODEL_MESSAGE: &str = "The configured AI model is not available.";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Status code plus `{ "error": ... }` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }
}

impl From<PostRagError> for ApiError {
    fn from(err: PostRagError) -> Self {
        match err {
            PostRagError::InvalidInput(message) => Self::bad_request(message),
            PostRagError::Unauthorized(reason) => {
                warn!("Rejected request: {}", reason);
                Self::unauthorized()
            }
            PostRagError::Llm(llm) => Self::from(llm),
            other => {
                error!("Request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        error!("Text generation failed: {}", err);
        match err {
            LlmError::RateLimited(_) => Self::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE),
            LlmError::InvalidApiKey(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INVALID_KEY_MESSAGE)
            }
            LlmError::ContentBlocked(_) => Self::bad_request(CONTENT_BLOCKED_MESSAGE),
            LlmError::UnknownModel(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, UNKNOWN_MODEL_MESSAGE)
            }
            LlmError::Request(_) | LlmError::InvalidResponse(_) | LlmError::Provider { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
