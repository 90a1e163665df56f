//! Per-request caller context, passed explicitly into the search service

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Identity confirmed by the authenticator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request-scoped context: created per request, dropped with the response
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user: None,
        }
    }

    pub fn for_user(user: AuthenticatedUser) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user: Some(user),
        }
    }

    /// For log lines
    pub fn caller(&self) -> &str {
        self.user.as_ref().map_or("anonymous", |u| u.id.as_str())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
