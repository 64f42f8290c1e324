use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{json_body, validate_id};
use super::{ApiError, ApiResponse, AppState, ListParams};
use crate::domain::{AnimeId, CommentId, ThreadId};
use crate::models::forum::{Comment, NewComment, NewThread, Thread, ThreadUpdate, Vote};

// ============================================================================
// Threads
// ============================================================================

/// POST /threads
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewThread>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    if let Some(anime_id) = input.anime_id {
        validate_id("anime", anime_id.value())?;
    }

    let thread = state.shared.forum_service.create_thread(&user, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(thread))))
}

/// GET /threads/anime/{anime_id}
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Path(anime_id): Path<i32>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Thread>>>, ApiError> {
    let anime_id = validate_id("anime", anime_id)?;
    let page = {
        let config = state.config().read().await;
        params.page_spec(&config.pagination)
    };

    let result = state
        .shared
        .forum_service
        .list_threads(AnimeId::new(anime_id), params.sort_spec(), page)
        .await?;

    Ok(Json(ApiResponse::paginated(result)))
}

/// GET /threads/{id}
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Thread>>, ApiError> {
    let id = validate_id("thread", id)?;
    let thread = state.shared.forum_service.view_thread(ThreadId::new(id)).await?;
    Ok(Json(ApiResponse::success(thread)))
}

/// PUT /threads/{id}
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    payload: Result<Json<ThreadUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Thread>>, ApiError> {
    let id = validate_id("thread", id)?;
    let changes = json_body(payload)?;

    let thread = state
        .shared
        .forum_service
        .update_thread(&user, ThreadId::new(id), changes)
        .await?;

    Ok(Json(ApiResponse::success(thread)))
}

/// DELETE /threads/{id}
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("thread", id)?;
    state
        .shared
        .forum_service
        .delete_thread(&user, ThreadId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

/// POST /comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    validate_id("thread", input.thread_id.value())?;

    let comment = state
        .shared
        .forum_service
        .create_comment(&user, input)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

/// GET /comments/thread/{thread_id}
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let thread_id = validate_id("thread", thread_id)?;
    let comments = state
        .shared
        .forum_service
        .list_comments(ThreadId::new(thread_id))
        .await?;
    Ok(Json(ApiResponse::success(comments)))
}

async fn vote(state: &AppState, id: i32, vote: Vote) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    let id = validate_id("comment", id)?;
    let comment = state
        .shared
        .forum_service
        .vote(CommentId::new(id), vote)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// PUT /comments/{id}/upvote
pub async fn upvote_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    vote(&state, id, Vote::Up).await
}

/// PUT /comments/{id}/downvote
pub async fn downvote_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    vote(&state, id, Vote::Down).await
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("comment", id)?;
    state
        .shared
        .forum_service
        .delete_comment(&user, CommentId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
