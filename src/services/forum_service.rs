//! Domain service for forum threads and comments.

use crate::db::repositories::forum::ThreadSort;
use crate::db::{CascadeError, CascadeReport, Page, PageSpec, SortSpec, StoreError};
use crate::domain::{AnimeId, AuthUser, CommentId, ThreadId};
use crate::models::forum::{Comment, NewComment, NewThread, Thread, ThreadUpdate, Vote};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    #[error("Anime not found: {0}")]
    AnimeNotFound(AnimeId),

    #[error("Thread {0} is locked")]
    ThreadLocked(ThreadId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for ForumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) | StoreError::Busy(msg) => Self::Conflict(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<CascadeError> for ForumError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound(target) => Self::ThreadNotFound(ThreadId::new(target.id())),
            CascadeError::Conflict(_) => Self::Conflict(err.to_string()),
            CascadeError::OperationFailed { .. } => Self::Database(err.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait ForumService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ForumError::AnimeNotFound`] if the thread names an anime
    /// that does not exist.
    async fn create_thread(&self, author: &AuthUser, input: NewThread)
    -> Result<Thread, ForumError>;

    /// Threads of one anime, pinned first.
    async fn list_threads(
        &self,
        anime_id: AnimeId,
        sort: SortSpec<ThreadSort>,
        page: PageSpec,
    ) -> Result<Page<Thread>, ForumError>;

    /// Returns the thread and counts the view.
    async fn view_thread(&self, id: ThreadId) -> Result<Thread, ForumError>;

    /// Authors may edit title and content; pinning and locking need a moderator.
    async fn update_thread(
        &self,
        actor: &AuthUser,
        id: ThreadId,
        changes: ThreadUpdate,
    ) -> Result<Thread, ForumError>;

    async fn delete_thread(
        &self,
        actor: &AuthUser,
        id: ThreadId,
    ) -> Result<CascadeReport, ForumError>;

    /// # Errors
    ///
    /// - Returns [`ForumError::ThreadNotFound`] if the thread does not exist
    /// - Returns [`ForumError::ThreadLocked`] if the thread no longer takes replies
    /// - Returns [`ForumError::Validation`] if the parent comment belongs to another thread
    async fn create_comment(
        &self,
        author: &AuthUser,
        input: NewComment,
    ) -> Result<Comment, ForumError>;

    async fn list_comments(&self, thread_id: ThreadId) -> Result<Vec<Comment>, ForumError>;

    async fn vote(&self, id: CommentId, vote: Vote) -> Result<Comment, ForumError>;

    async fn delete_comment(&self, actor: &AuthUser, id: CommentId) -> Result<(), ForumError>;
}
