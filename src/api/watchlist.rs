use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{json_body, optional_filter, validate_id};
use super::{ApiError, ApiResponse, AppState, WatchlistQuery};
use crate::domain::{AnimeId, UserId};
use crate::models::watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistUpdate};

/// POST /watchlist
/// Adds an anime to the caller's own list.
pub async fn add_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<NewWatchlistEntry>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    validate_id("anime", input.anime_id.value())?;

    let entry = state.shared.watchlist_service.add(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))))
}

/// GET /watchlist/{user_id}
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i32>,
    Query(query): Query<WatchlistQuery>,
) -> Result<Json<ApiResponse<Vec<WatchlistEntry>>>, ApiError> {
    let user_id = validate_id("user", user_id)?;
    let page = {
        let config = state.config().read().await;
        query.list.page_spec(&config.pagination)
    };

    let result = state
        .shared
        .watchlist_service
        .list(
            &user,
            UserId::new(user_id),
            optional_filter(query.status.as_deref()),
            query.list.sort_spec(),
            page,
        )
        .await?;

    Ok(Json(ApiResponse::paginated(result)))
}

/// PUT /watchlist/{anime_id}
pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(anime_id): Path<i32>,
    payload: Result<Json<WatchlistUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<WatchlistEntry>>, ApiError> {
    let anime_id = validate_id("anime", anime_id)?;
    let changes = json_body(payload)?;

    let entry = state
        .shared
        .watchlist_service
        .update(user.id, AnimeId::new(anime_id), changes)
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}

/// DELETE /watchlist/{anime_id}
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(anime_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let anime_id = validate_id("anime", anime_id)?;
    state
        .shared
        .watchlist_service
        .remove(user.id, AnimeId::new(anime_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
