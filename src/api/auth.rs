//! Bearer token authentication and per-request context extraction

use std::time::Duration;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::api::error::ApiError;
use crate::api::handlers::AppState;
use crate::config::AuthConfig;
use crate::errors::PostRagError;
use crate::errors::Result;
use crate::session::AuthenticatedUser;
use crate::session::RequestContext;

const VERIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Endpoint that turns a bearer token into a user
#[derive(Debug, Clone)]
struct RemoteVerifier {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

/// Validates bearer tokens against static tokens and an optional remote endpoint
#[derive(Debug, Clone)]
pub struct Authenticator {
    required: bool,
    static_tokens: Vec<String>,
    remote: Option<RemoteVerifier>,
}

impl Authenticator {
    /// Build from the `[auth]` section
    ///
    /// # Errors
    /// - HTTP client build errors when `verify_url` is set
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let remote = match &config.verify_url {
            Some(url) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(VERIFY_TIMEOUT_SECS))
                    .build()
                    .map_err(|e| PostRagError::HttpError(e.to_string()))?;
                Some(RemoteVerifier {
                    url: url.clone(),
                    api_key: config.api_key.clone(),
                    client,
                })
            }
            None => None,
        };

        Ok(Self {
            required: config.required,
            static_tokens: config.static_tokens.clone(),
            remote,
        })
    }

    /// Accepts anonymous callers and no tokens
    pub fn disabled() -> Self {
        Self::with_static_tokens(false, Vec::new())
    }

    pub fn with_static_tokens(required: bool, tokens: Vec<String>) -> Self {
        Self {
            required,
            static_tokens: tokens,
            remote: None,
        }
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Resolve the caller for an optional bearer token.
    ///
    /// # Errors
    /// `Unauthorized` when the token is invalid, or missing while required
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Option<AuthenticatedUser>> {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            if self.required {
                return Err(PostRagError::Unauthorized("missing bearer token".to_string()));
            }
            return Ok(None);
        };

        if let Some(position) = self.static_tokens.iter().position(|t| t == token) {
            debug!("Authenticated static token #{}", position + 1);
            return Ok(Some(AuthenticatedUser {
                id: format!("static-{}", position + 1),
                email: None,
            }));
        }

        match &self.remote {
            Some(remote) => remote.verify(token).await.map(Some),
            None => Err(PostRagError::Unauthorized("unknown bearer token".to_string())),
        }
    }
}

impl RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        let mut request = self.client.get(self.url.as_str()).bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Token verification request failed: {}", e);
            PostRagError::Unauthorized(format!("verification unavailable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PostRagError::Unauthorized(format!(
                "verification endpoint returned {status}"
            )));
        }

        let user: VerifiedUser = response.json().await.map_err(|e| {
            PostRagError::Unauthorized(format!("malformed verification response: {e}"))
        })?;

        debug!("Authenticated user {}", user.id);
        Ok(AuthenticatedUser {
            id: user.id,
            email: user.email,
        })
    }
}

/// `Some(token)` for `Bearer <token>`, `Some("")` for any other present value
fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .unwrap_or_default();
    Some(token.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            // A present header that carries no usable token is never treated as anonymous
            Some(token) if token.is_empty() => {
                return Err(ApiError::from(PostRagError::Unauthorized(
                    "malformed authorization header".to_string(),
                )))
            }
            Some(token) => state.auth.authenticate(Some(&token)).await?,
            None => state.auth.authenticate(None).await?,
        };

        Ok(user.map_or_else(RequestContext::anonymous, RequestContext::for_user))
    }
}
