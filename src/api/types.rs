//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `POST /api/search` body
#[derive(Debug, Deserialize)]
pub struct SearchRequestBody {
    #[serde(default)]
    pub question_text: String,
    /// Any JSON number: JS clients send `3.0`, and zero or negative values clamp
    #[serde(default, rename = "topK")]
    pub top_k: Option<f64>,
}

impl SearchRequestBody {
    /// Truncated towards zero, at least 1; float-to-int casts saturate
    pub fn requested_top_k(&self) -> Option<usize> {
        self.top_k.map(|k| k.max(1.0).trunc() as usize)
    }
}

/// Body of every non-2xx response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
