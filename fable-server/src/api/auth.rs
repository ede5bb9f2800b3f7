use axum::{extract::State, http::HeaderMap, Json};
use fable_types::{LoginRequest, LoginResponse, RegisterRequest};

use super::{ApiError, ApiResult};
use crate::db::repositories::UserRepository;
use crate::password;
use crate::state::AppState;

const MAX_USERNAME_LENGTH: usize = 64;

/// A UNIQUE violation from the insert means another request registered the
/// same name between our pre-check and the write; report it the same way
/// the pre-check would have.
fn registration_error(e: anyhow::Error) -> ApiError {
    match e.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(f, _))
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ApiError::BadRequest("Username already taken. Please choose another.".to_string())
        }
        _ => ApiError::InternalError(e.to_string()),
    }
}

/// POST /auth/register - Create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = payload.username.trim().to_string();
    let password = payload.password.trim().to_string();

    if username.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds {MAX_USERNAME_LENGTH} character limit"
        )));
    }

    let repo = UserRepository::new(state.db.pool.clone());

    // Uniqueness is case-insensitive
    if repo
        .get_by_username(&username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "Username already taken. Please choose another.".to_string(),
        ));
    }

    let hash = password::hash_password(password)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = repo.create(&username, &hash).map_err(registration_error)?;

    let session_token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Registered user {}", user.username);
    Ok(Json(LoginResponse {
        user,
        session_token,
    }))
}

/// POST /auth/login - Authenticate and open a session
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.pool.clone());

    // Unknown user and wrong password answer identically
    let credentials = repo
        .find_credentials(payload.username.trim())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let (user, hash) = credentials.ok_or_else(|| {
        ApiError::Unauthorized("Login failed. Check username and password.".to_string())
    })?;

    let valid = password::verify_password(payload.password, hash)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Login failed. Check username and password.".to_string(),
        ));
    }

    let session_token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LoginResponse {
        user,
        session_token,
    }))
}

/// POST /auth/logout - Close the presented session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .session_manager
        .delete_session(token)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "You have been logged out successfully."
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_racing_duplicate_insert_maps_to_bad_request() {
        let db = Database::in_memory().expect("Failed to create test database");
        let repo = UserRepository::new(db.pool.clone());
        repo.create("aria", "hash").expect("Failed to create user");

        // Two registrations can pass the pre-check before either inserts;
        // the loser's constraint violation must read like a duplicate name,
        // not a server error.
        let err = repo.create("ARIA", "hash").expect_err("Duplicate should fail");
        match registration_error(err) {
            ApiError::BadRequest(msg) => assert!(msg.contains("already taken")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_other_failures_stay_internal() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(matches!(
            registration_error(err),
            ApiError::InternalError(_)
        ));
    }
}
