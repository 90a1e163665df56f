//! Provider failure classification

use thiserror::Error;

/// Failure reported by a text-generation provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("content blocked by safety filter: {0}")]
    ContentBlocked(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "too many requests",
    "quota",
    "resource_exhausted",
];

const SAFETY_MARKERS: &[&str] = &[
    "safety",
    "content_filter",
    "content filter",
    "content_policy",
    "content policy",
];

const API_KEY_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "invalid_api_key",
    "unauthorized",
    "unauthenticated",
    "permission_denied",
];

const MODEL_MARKERS: &[&str] = &[
    "model_not_found",
    "model not found",
    "not found for api version",
    "unknown model",
];

impl LlmError {
    /// Map an HTTP status and provider message onto an error kind.
    ///
    /// Providers disagree on status codes (Gemini reports a bad key as 400), so the
    /// message text is consulted as well.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
        let message = message.to_string();

        if status == Some(429) || has(RATE_LIMIT_MARKERS) {
            return Self::RateLimited(message);
        }
        // A restricted key can be reported as "blocked", so the status wins
        if matches!(status, Some(401 | 403)) {
            return Self::InvalidApiKey(message);
        }
        if has(SAFETY_MARKERS) {
            return Self::ContentBlocked(message);
        }
        if has(API_KEY_MARKERS) {
            return Self::InvalidApiKey(message);
        }
        if has(MODEL_MARKERS)
            || (status == Some(404) && lower.contains("model"))
            || (lower.contains("model") && lower.contains("does not exist"))
        {
            return Self::UnknownModel(message);
        }

        match status {
            Some(status) => Self::Provider { status, message },
            None => Self::Request(message),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::InvalidResponse(err.to_string());
        }
        Self::classify(err.status().map(|s| s.as_u16()), &err.to_string())
    }
}
