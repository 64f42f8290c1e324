use axum::{
    Json,
    extract::{FromRequestParts, Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{json_body, validate_email, validate_username};
use super::{ApiError, ApiKeyResponse, ApiResponse, AppState};
use crate::domain::{AuthUser, Role, UserId};
use crate::models::user::User;
use crate::services::{LoginResult, Registration};

const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller's identity from, in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <token>` header
///
/// Requests without credentials pass through anonymously; a credential that
/// does not match any account is rejected.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth = &state.shared.auth_service;

    // Check session first (fastest path for web UI)
    let mut identity = None;
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        identity = auth.authenticate_user_id(UserId::new(user_id)).await?;
    }

    if identity.is_none()
        && let Some(key) = extract_api_key(&headers)
    {
        identity = auth.authenticate_api_key(&key).await?;
        if identity.is_none() {
            return Err(ApiError::Unauthorized("Invalid API key".to_string()));
        }
    }

    if let Some(user) = identity {
        tracing::Span::current().record("user_id", user.id.value());
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

/// Extract API key from headers
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    // Check X-Api-Key header
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    // Check Authorization: Bearer header
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Extractors
// ============================================================================

/// Any authenticated caller.
pub struct CurrentUser(pub AuthUser);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(Self)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// An authenticated caller with the admin role.
pub struct AdminUser(pub AuthUser);

impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(Self(user))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create a regular account and return its token
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = json_body(payload)?;
    let username = validate_username(&payload.username)?.to_string();
    let email = validate_email(&payload.email)?.to_string();

    let result = state
        .shared
        .auth_service
        .register(Registration {
            username,
            email,
            password: payload.password,
            role: Role::User,
        })
        .await?;

    tracing::info!(user_id = result.user.id, "Registered new user");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(result))))
}

/// POST /auth/login
/// Authenticate with username and password, returns the token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let payload = json_body(payload)?;
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .shared
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, result.user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session: {e}");
    }
    Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let profile = state.shared.user_service.get_user(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// POST /auth/api-key/regenerate
/// Generate a new random token; the old one stops working immediately
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let token = state
        .shared
        .auth_service
        .regenerate_api_key(user.id)
        .await?;

    Ok(Json(ApiResponse::success(ApiKeyResponse { token })))
}
