use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use fable_types::{Page, Post, UpdateBioRequest, User};

use super::{optional_user, require_user, ApiError, ApiResult, PageQuery};
use crate::db::repositories::{FollowRepository, PostRepository, UserRepository};
use crate::state::AppState;

const FOLLOW_LIST_PER_PAGE: i64 = 20;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub posts: Page<Post>,
    pub follower_count: usize,
    pub following_count: usize,
    /// Whether the requesting user follows this profile; absent for
    /// anonymous requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

fn load_user_by_name(state: &AppState, username: &str) -> Result<User, ApiError> {
    UserRepository::new(state.db.pool.clone())
        .get_by_username(username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("User '{username}' not found")))
}

/// Hydrate a page of user ids into full user records, preserving order
fn hydrate_users(state: &AppState, page: Page<uuid::Uuid>) -> Result<Page<User>, ApiError> {
    let repo = UserRepository::new(state.db.pool.clone());
    let mut users = Vec::with_capacity(page.items.len());
    for id in &page.items {
        if let Some(user) = repo
            .get_by_id(id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
        {
            users.push(user);
        }
    }
    Ok(Page {
        items: users,
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        pages: page.pages,
        has_prev: page.has_prev,
        has_next: page.has_next,
        prev_num: page.prev_num,
        next_num: page.next_num,
    })
}

/// GET /profile/:username - Public profile with a page of the author's posts
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = load_user_by_name(&state, &username)?;

    let posts = PostRepository::new(state.db.pool.clone())
        .author_page(&user.id, query.page(), super::posts::POSTS_PER_PAGE)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let follows = FollowRepository::new(state.db.pool.clone());
    let follower_count = follows
        .follower_count(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let following_count = follows
        .following_count(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let is_following = match optional_user(&state, &headers) {
        Some(viewer_id) => Some(
            follows
                .is_following(&viewer_id, &user.id)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        ),
        None => None,
    };

    Ok(Json(ProfileResponse {
        user,
        posts,
        follower_count,
        following_count,
        is_following,
    }))
}

/// GET /profile/:username/followers - Who follows this user
pub async fn list_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<User>>> {
    let user = load_user_by_name(&state, &username)?;
    let ids = FollowRepository::new(state.db.pool.clone())
        .followers_page(&user.id, query.page(), FOLLOW_LIST_PER_PAGE)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(hydrate_users(&state, ids)?))
}

/// GET /profile/:username/following - Who this user follows
pub async fn list_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<User>>> {
    let user = load_user_by_name(&state, &username)?;
    let ids = FollowRepository::new(state.db.pool.clone())
        .following_page(&user.id, query.page(), FOLLOW_LIST_PER_PAGE)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(hydrate_users(&state, ids)?))
}

/// PUT /profile - Update the authenticated user's bio
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateBioRequest>,
) -> ApiResult<Json<User>> {
    let user_id = require_user(&state, &headers)?;

    let repo = UserRepository::new(state.db.pool.clone());
    repo.update_bio(&user_id, payload.bio.trim())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
