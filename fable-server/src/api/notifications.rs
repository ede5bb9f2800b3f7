use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use fable_types::{Notification, Page};

use super::{require_user, ApiError, ApiResult};
use crate::db::repositories::NotificationRepository;
use crate::state::AppState;

const NOTIFICATIONS_PER_PAGE: i64 = 10;

#[derive(Deserialize)]
pub struct NotificationsQuery {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default)]
    unread_only: bool,
}

fn default_page() -> i64 {
    1
}

/// Load a notification and verify the requester owns it
fn load_owned(
    state: &AppState,
    notification_id: &Uuid,
    user_id: &Uuid,
) -> Result<Notification, ApiError> {
    let notification = NotificationRepository::new(state.db.pool.clone())
        .get_by_id(notification_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    if notification.recipient_id != *user_id {
        return Err(ApiError::Forbidden(
            "This notification belongs to another user".to_string(),
        ));
    }
    Ok(notification)
}

/// GET /notifications - The authenticated user's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationsQuery>,
) -> ApiResult<Json<Page<Notification>>> {
    let user_id = require_user(&state, &headers)?;
    let page = NotificationRepository::new(state.db.pool.clone())
        .page_for_recipient(
            &user_id,
            query.unread_only,
            query.page.max(1),
            NOTIFICATIONS_PER_PAGE,
        )
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(page))
}

/// GET /notifications/unread-count - Badge counter
pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let count = NotificationRepository::new(state.db.pool.clone())
        .unread_count(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(serde_json::json!({ "count": count })))
}

/// POST /notifications/mark-read - Mark everything read
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let updated = NotificationRepository::new(state.db.pool.clone())
        .mark_all_read(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(serde_json::json!({
        "message": "All notifications marked as read.",
        "updated": updated
    })))
}

/// POST /notifications/:id/mark-read - Mark one read (owner only)
pub async fn mark_one_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let user_id = require_user(&state, &headers)?;
    load_owned(&state, &notification_id, &user_id)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    repo.mark_read(&notification_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let updated = repo
        .get_by_id(&notification_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;
    Ok(Json(updated))
}

/// DELETE /notifications/:id - Delete one (owner only)
pub async fn delete_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    load_owned(&state, &notification_id, &user_id)?;

    NotificationRepository::new(state.db.pool.clone())
        .delete(&notification_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({ "message": "Notification deleted." })))
}

/// DELETE /notifications - Clear the authenticated user's notifications
pub async fn clear_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let removed = NotificationRepository::new(state.db.pool.clone())
        .delete_all_for_recipient(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(serde_json::json!({
        "message": "All notifications cleared.",
        "removed": removed
    })))
}
