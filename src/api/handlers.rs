//! API request handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::api::auth::Authenticator;
use crate::api::error::ApiError;
use crate::api::types::HealthResponse;
use crate::api::types::SearchRequestBody;
use crate::rag::SearchRequest;
use crate::rag::SearchResult;
use crate::rag::SearchService;
use crate::session::RequestContext;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(search: SearchService, auth: Authenticator) -> Self {
        Self {
            search: Arc::new(search),
            auth: Arc::new(auth),
        }
    }
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Grounded answer search (POST /api/search)
pub async fn search(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<SearchRequestBody>, JsonRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    info!(
        request_id = %ctx.request_id,
        "POST /api/search (topK={:?})",
        body.top_k
    );

    let request = SearchRequest {
        top_k: body.requested_top_k(),
        question: body.question_text,
    };
    let outcome = state.search.search(&ctx, request).await?;
    Ok(Json(outcome.result))
}
