use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::AdminUser;
use super::validation::{json_body, validate_anime_update, validate_id, validate_new_anime};
use super::{AnimeListQuery, ApiError, ApiResponse, AppState};
use crate::db::repositories::anime::AnimeFilter;
use crate::domain::AnimeId;
use crate::models::anime::{Anime, AnimeUpdate, NewAnime};

/// GET /anime
pub async fn list_anime(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimeListQuery>,
) -> Result<Json<ApiResponse<Vec<Anime>>>, ApiError> {
    let page = {
        let config = state.config().read().await;
        query.list.page_spec(&config.pagination)
    };

    let filter = AnimeFilter {
        genre: query.genre,
        studio: query.studio,
        search: query.search,
    };

    let result = state
        .shared
        .anime_service
        .list_anime(filter, query.list.sort_spec(), page)
        .await?;

    Ok(Json(ApiResponse::paginated(result)))
}

/// GET /anime/{id}
pub async fn get_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let id = validate_id("anime", id)?;
    let anime = state.shared.anime_service.get_anime(AnimeId::new(id)).await?;
    Ok(Json(ApiResponse::success(anime)))
}

/// POST /anime
pub async fn create_anime(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    payload: Result<Json<NewAnime>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    validate_new_anime(&input)?;

    let anime = state.shared.anime_service.create_anime(input).await?;
    tracing::info!(anime_id = anime.id, title = %anime.title, "Created anime");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(anime))))
}

/// PUT /anime/{id}
pub async fn update_anime(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
    payload: Result<Json<AnimeUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Anime>>, ApiError> {
    let id = validate_id("anime", id)?;
    let changes = json_body(payload)?;
    validate_anime_update(&changes)?;

    let anime = state
        .shared
        .anime_service
        .update_anime(AnimeId::new(id), changes)
        .await?;

    Ok(Json(ApiResponse::success(anime)))
}

/// DELETE /anime/{id}
/// Removes the anime with its threads, their comments and watchlist entries.
pub async fn delete_anime(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("anime", id)?;
    let report = state
        .shared
        .anime_service
        .delete_anime(AnimeId::new(id))
        .await?;

    tracing::info!(
        anime_id = id,
        actor = admin.id.value(),
        threads = report.rows_for("forum_threads"),
        comments = report.rows_for("forum_comments"),
        watchlist = report.rows_for("user_anime_list"),
        "Anime removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
