//! Domain service for authentication and account registration.
//!
//! Handles registration, login, API key verification and API key rotation.

use crate::db::StoreError;
use crate::domain::{AuthUser, Role, UserId};
use crate::models::user::User;
use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Username or email already in use")]
    AlreadyExists,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::AlreadyExists,
            StoreError::NotFound(_) => Self::UserNotFound,
            StoreError::Internal(msg) => Self::Internal(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

/// Login result containing the bearer token and the account.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

/// Account fields accepted at registration or from the CLI.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and returns its token.
    ///
    /// # Errors
    ///
    /// - Returns [`AuthError::Validation`] if the password is too short
    /// - Returns [`AuthError::AlreadyExists`] if the username or email is taken
    async fn register(&self, registration: Registration) -> Result<LoginResult, AuthError>;

    /// Verifies credentials and returns the account with its token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to the identity it belongs to.
    async fn authenticate_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError>;

    /// Resolves a session's user id; `None` if the account was deleted since.
    async fn authenticate_user_id(&self, id: UserId) -> Result<Option<AuthUser>, AuthError>;

    /// Regenerates the API key for a user and returns the new one.
    async fn regenerate_api_key(&self, id: UserId) -> Result<String, AuthError>;
}
