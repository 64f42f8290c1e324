//! Domain service for user accounts.

use crate::db::repositories::user::{UserFilter, UserSort};
use crate::db::{CascadeError, CascadeReport, Page, PageSpec, SortSpec, StoreError};
use crate::domain::{AuthUser, UserId};
use crate::models::user::{User, UserUpdate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("Not allowed to modify user {0}")]
    Forbidden(UserId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) | StoreError::Busy(msg) => Self::Conflict(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<CascadeError> for UserError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound(target) => Self::NotFound(UserId::new(target.id())),
            CascadeError::Conflict(_) => Self::Conflict(err.to_string()),
            CascadeError::OperationFailed { .. } => Self::Database(err.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(
        &self,
        filter: UserFilter,
        sort: SortSpec<UserSort>,
        page: PageSpec,
    ) -> Result<Page<User>, UserError>;

    async fn get_user(&self, id: UserId) -> Result<User, UserError>;

    /// Updates profile fields, credentials included.
    ///
    /// # Errors
    ///
    /// - Returns [`UserError::Forbidden`] unless `actor` is the user or an admin
    /// - Returns [`UserError::Validation`] if nothing would change or the password is too short
    /// - Returns [`UserError::Conflict`] if the new username or email is taken
    async fn update_user(
        &self,
        actor: &AuthUser,
        id: UserId,
        changes: UserUpdate,
    ) -> Result<User, UserError>;

    /// Deletes the account with its comments, threads (and the replies in
    /// them) and watchlist, atomically.
    async fn delete_user(&self, id: UserId) -> Result<CascadeReport, UserError>;
}
