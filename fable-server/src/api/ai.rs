use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{require_user, ApiResult};
use crate::state::AppState;

/// AI endpoints never surface upstream failures as server errors; a failed
/// model call comes back as `{success: false, error}` with HTTP 200. Only
/// missing input fields produce a 400.
fn missing_field(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct ContinueStoryRequest {
    #[serde(default)]
    content: String,
    #[serde(default = "default_genre")]
    genre: String,
    #[serde(default = "default_continue_words")]
    words: u32,
}

#[derive(Deserialize)]
pub struct StoryStarterRequest {
    #[serde(default = "default_genre")]
    genre: String,
    #[serde(default)]
    theme: String,
    #[serde(default = "default_starter_words")]
    words: u32,
}

#[derive(Deserialize)]
pub struct SuggestTitlesRequest {
    #[serde(default)]
    content: String,
    #[serde(default = "default_title_count")]
    count: u32,
}

#[derive(Deserialize)]
pub struct ImproveWritingRequest {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
pub struct GetSuggestionsRequest {
    #[serde(default)]
    content: String,
}

fn default_genre() -> String {
    "general".to_string()
}

fn default_continue_words() -> u32 {
    150
}

fn default_starter_words() -> u32 {
    200
}

fn default_title_count() -> u32 {
    5
}

/// POST /api/ai/continue-story
pub async fn continue_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ContinueStoryRequest>,
) -> ApiResult<Response> {
    require_user(&state, &headers)?;
    if payload.content.is_empty() {
        return Ok(missing_field("No content provided"));
    }
    let result = state
        .ai
        .continue_story(&payload.content, &payload.genre, payload.words)
        .await;
    Ok(Json(result).into_response())
}

/// POST /api/ai/generate-starter
pub async fn generate_starter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StoryStarterRequest>,
) -> ApiResult<Response> {
    require_user(&state, &headers)?;
    let result = state
        .ai
        .generate_story_starter(&payload.genre, &payload.theme, payload.words)
        .await;
    Ok(Json(result).into_response())
}

/// POST /api/ai/suggest-titles
pub async fn suggest_titles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SuggestTitlesRequest>,
) -> ApiResult<Response> {
    require_user(&state, &headers)?;
    if payload.content.is_empty() {
        return Ok(missing_field("No content provided"));
    }
    let result = state.ai.suggest_titles(&payload.content, payload.count).await;
    Ok(Json(result).into_response())
}

/// POST /api/ai/improve-writing
pub async fn improve_writing(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ImproveWritingRequest>,
) -> ApiResult<Response> {
    require_user(&state, &headers)?;
    if payload.text.is_empty() {
        return Ok(missing_field("No text provided"));
    }
    let result = state.ai.improve_writing(&payload.text).await;
    Ok(Json(result).into_response())
}

/// POST /api/ai/get-suggestions
pub async fn get_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GetSuggestionsRequest>,
) -> ApiResult<Response> {
    require_user(&state, &headers)?;
    if payload.content.is_empty() {
        return Ok(missing_field("No content provided"));
    }
    let result = state.ai.get_writing_suggestions(&payload.content).await;
    Ok(Json(result).into_response())
}
