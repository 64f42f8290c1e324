use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::{AdminUser, CurrentUser};
use super::validation::{json_body, optional_filter, validate_email, validate_id, validate_username};
use super::{ApiError, ApiResponse, AppState, UserListQuery};
use crate::db::repositories::user::UserFilter;
use crate::domain::UserId;
use crate::models::user::{User, UserUpdate};

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let page = {
        let config = state.config().read().await;
        query.list.page_spec(&config.pagination)
    };

    let filter = UserFilter {
        role: optional_filter(query.role.as_deref()),
        search: query.search,
    };

    let result = state
        .shared
        .user_service
        .list_users(filter, query.list.sort_spec(), page)
        .await?;

    Ok(Json(ApiResponse::paginated(result)))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.shared.user_service.get_user(UserId::new(id)).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i32>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let id = validate_id("user", id)?;
    let mut changes = json_body(payload)?;

    if let Some(username) = &changes.username {
        changes.username = Some(validate_username(username)?.to_string());
    }
    if let Some(email) = &changes.email {
        changes.email = Some(validate_email(email)?.to_string());
    }

    let user = state
        .shared
        .user_service
        .update_user(&actor, UserId::new(id), changes)
        .await?;

    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{id}
/// Removes the account, everything it authored and its watchlist.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("user", id)?;
    if admin.id == UserId::new(id) {
        return Err(ApiError::validation("Admins cannot delete their own account"));
    }

    state
        .shared
        .user_service
        .delete_user(UserId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
