use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use super::{require_user, ApiError, ApiResult};
use crate::db::repositories::{FollowRepository, UserRepository};
use crate::state::AppState;

/// POST /follow/:username - Follow a user. Re-following is an informational
/// no-op; the notification only fires for a genuinely new edge.
pub async fn follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let follower_id = require_user(&state, &headers)?;

    let users = UserRepository::new(state.db.pool.clone());
    let target = users
        .get_by_username(&username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("User '{username}' not found")))?;

    if target.id == follower_id {
        return Err(ApiError::BadRequest(
            "You cannot follow yourself!".to_string(),
        ));
    }

    let newly_followed = FollowRepository::new(state.db.pool.clone())
        .follow(&follower_id, &target.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if !newly_followed {
        return Ok(Json(serde_json::json!({
            "message": format!("You are already following {}.", target.username)
        })));
    }

    let follower = users
        .get_by_id(&follower_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state
        .notifier
        .user_followed(&follower, &target.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": format!("You are now following {}!", target.username)
    })))
}

/// POST /unfollow/:username - Unfollow a user. Unfollowing someone you do
/// not follow is an informational no-op rather than an error.
pub async fn unfollow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let follower_id = require_user(&state, &headers)?;

    let target = UserRepository::new(state.db.pool.clone())
        .get_by_username(&username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("User '{username}' not found")))?;

    if target.id == follower_id {
        return Err(ApiError::BadRequest(
            "You cannot unfollow yourself!".to_string(),
        ));
    }

    let removed = FollowRepository::new(state.db.pool.clone())
        .unfollow(&follower_id, &target.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let message = if removed > 0 {
        format!("You have unfollowed {}.", target.username)
    } else {
        format!("You were not following {}.", target.username)
    };

    Ok(Json(serde_json::json!({ "message": message })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiClient;
    use crate::db::repositories::NotificationRepository;
    use crate::db::Database;
    use axum::extract::{Path, State};
    use fable_types::User;

    fn setup(name: &str) -> (AppState, User, HeaderMap) {
        let db = Database::in_memory().expect("Failed to create test database");
        let user = UserRepository::new(db.pool.clone())
            .create(name, "hash")
            .expect("Failed to create user");
        let state = AppState::new(db, AiClient::new(None));
        let token = state
            .session_manager
            .create_session(user.id)
            .expect("Failed to create session");
        let mut headers = HeaderMap::new();
        headers.insert("X-Session-Token", token.parse().unwrap());
        (state, user, headers)
    }

    #[tokio::test]
    async fn test_self_follow_rejected_without_side_effects() {
        let (state, user, headers) = setup("aria");

        // Case-insensitive target lookup still resolves to the caller
        let result = follow(State(state.clone()), headers, Path("ARIA".to_string())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        let follows = FollowRepository::new(state.db.pool.clone());
        assert!(!follows.is_following(&user.id, &user.id).unwrap());
        assert_eq!(follows.follower_count(&user.id).unwrap(), 0);

        let notifications = NotificationRepository::new(state.db.pool.clone());
        assert_eq!(notifications.unread_count(&user.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_self_unfollow_rejected() {
        let (state, _user, headers) = setup("theo");
        let result = unfollow(State(state), headers, Path("theo".to_string())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_handler_creates_edge_and_notification() {
        let (state, follower, headers) = setup("mina");
        let target = UserRepository::new(state.db.pool.clone())
            .create("aria", "hash")
            .expect("Failed to create user");

        follow(State(state.clone()), headers.clone(), Path("aria".to_string()))
            .await
            .expect("Follow should succeed");

        let follows = FollowRepository::new(state.db.pool.clone());
        assert!(follows.is_following(&follower.id, &target.id).unwrap());

        let notifications = NotificationRepository::new(state.db.pool.clone());
        assert_eq!(notifications.unread_count(&target.id).unwrap(), 1);

        // Repeat follow: informational no-op, no second notification
        follow(State(state.clone()), headers, Path("aria".to_string()))
            .await
            .expect("Repeat follow should not error");
        assert_eq!(notifications.unread_count(&target.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_404() {
        let (state, _user, headers) = setup("quinn");
        let result = follow(State(state), headers, Path("nobody".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
