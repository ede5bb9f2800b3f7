use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use fable_types::{Comment, CreateCommentRequest, CreatePostRequest, Page, Post, UpdatePostRequest};

use super::{require_user, ApiError, ApiResult, PageQuery};
use crate::db::repositories::{CommentRepository, LikeRepository, PostRepository, UserRepository};
use crate::state::AppState;

pub const POSTS_PER_PAGE: i64 = 5;
const MAX_TITLE_LENGTH: usize = 140;
const DEFAULT_CATEGORY: &str = "Others";

#[derive(Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub likes: i64,
}

fn load_post(state: &AppState, post_id: &Uuid) -> Result<Post, ApiError> {
    PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// GET /posts - Global feed, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let page = PostRepository::new(state.db.pool.clone())
        .global_page(query.page(), POSTS_PER_PAGE)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(page))
}

/// GET /feed - Posts from followed authors only
pub async fn followed_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Post>>> {
    let user_id = require_user(&state, &headers)?;
    let page = PostRepository::new(state.db.pool.clone())
        .followed_page(&user_id, query.page(), POSTS_PER_PAGE)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(page))
}

/// POST /posts - Publish a new story and fan it out to followers
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let author_id = require_user(&state, &headers)?;

    let title = payload.title.trim().to_string();
    let content = payload.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::BadRequest(
            "Title and content are required".to_string(),
        ));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Title exceeds {MAX_TITLE_LENGTH} character limit (current: {})",
            title.len()
        )));
    }

    let author = UserRepository::new(state.db.pool.clone())
        .get_by_id(&author_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let category = payload
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let post = Post {
        id: Uuid::new_v4(),
        author_id,
        author_username: author.username.clone(),
        title,
        content,
        category,
        created_at: Utc::now(),
        likes: 0,
        views: 0,
    };

    PostRepository::new(state.db.pool.clone())
        .create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    state
        .notifier
        .post_published(&author, &post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(post))
}

/// GET /posts/:id - Story detail. Every fetch bumps the view counter.
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let repo = PostRepository::new(state.db.pool.clone());
    let mut post = load_post(&state, &post_id)?;

    post.views = repo
        .increment_views(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let comments = CommentRepository::new(state.db.pool.clone())
        .for_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(PostDetail { post, comments }))
}

/// PUT /posts/:id - Edit a story (owner only)
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let user_id = require_user(&state, &headers)?;
    let post = load_post(&state, &post_id)?;
    if post.author_id != user_id {
        return Err(ApiError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }

    let title = payload.title.trim().to_string();
    let content = payload.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::BadRequest(
            "Title and content are required".to_string(),
        ));
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Title exceeds {MAX_TITLE_LENGTH} character limit (current: {})",
            title.len()
        )));
    }

    let repo = PostRepository::new(state.db.pool.clone());
    repo.update(&post_id, &title, &content)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let updated = load_post(&state, &post_id)?;
    Ok(Json(updated))
}

/// DELETE /posts/:id - Remove a story (owner only); comments and likes cascade
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let post = load_post(&state, &post_id)?;
    if post.author_id != user_id {
        return Err(ApiError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    PostRepository::new(state.db.pool.clone())
        .delete(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({ "message": "Post deleted." })))
}

/// POST /posts/:id/comments - Comment on a story
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let user_id = require_user(&state, &headers)?;
    let post = load_post(&state, &post_id)?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }

    let commenter = UserRepository::new(state.db.pool.clone())
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id: user_id,
        author_username: commenter.username.clone(),
        content,
        created_at: Utc::now(),
    };

    CommentRepository::new(state.db.pool.clone())
        .create(&comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    state
        .notifier
        .post_commented(&commenter, &post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comment))
}

/// POST /posts/:id/like - Like a story. A repeat like is an informational
/// no-op: the counter does not move and no notification fires.
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<LikeResponse>> {
    let user_id = require_user(&state, &headers)?;
    let post = load_post(&state, &post_id)?;

    let newly_liked = LikeRepository::new(state.db.pool.clone())
        .like(&user_id, &post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if !newly_liked {
        return Ok(Json(LikeResponse {
            message: "You have already liked this post.".to_string(),
            likes: post.likes,
        }));
    }

    let likes = PostRepository::new(state.db.pool.clone())
        .increment_likes(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let liker = UserRepository::new(state.db.pool.clone())
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state
        .notifier
        .post_liked(&liker, &post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LikeResponse {
        message: "You liked this post!".to_string(),
        likes,
    }))
}
