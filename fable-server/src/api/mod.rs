pub mod ai;
pub mod auth;
pub mod error;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod social;

pub use error::{ApiError, ApiResult};

use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;

/// Extract the authenticated user ID from the session token header
pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .authenticated_user_id(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Like `require_user`, but anonymous requests are allowed
pub(crate) fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    require_user(state, headers).ok()
}

/// 1-indexed `?page=` query parameter. Values below 1 are treated as
/// page 1; pages past the end come back empty rather than erroring.
#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }
}
