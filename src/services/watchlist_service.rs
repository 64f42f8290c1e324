//! Domain service for per-user watchlists.

use crate::db::repositories::watchlist::WatchlistSort;
use crate::db::{Page, PageSpec, SortSpec, StoreError};
use crate::domain::{AnimeId, AuthUser, UserId, WatchStatus};
use crate::models::watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistUpdate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Anime not found: {0}")]
    AnimeNotFound(AnimeId),

    #[error("Anime {0} is not on the watchlist")]
    EntryNotFound(AnimeId),

    #[error("Anime {0} is already on the watchlist")]
    AlreadyListed(AnimeId),

    #[error("Not allowed to view the watchlist of user {0}")]
    Forbidden(UserId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for WatchlistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) | StoreError::Busy(msg) => Self::Conflict(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
pub trait WatchlistService: Send + Sync {
    /// Adds an anime to the caller's list. An existing entry is never overwritten.
    ///
    /// # Errors
    ///
    /// - Returns [`WatchlistError::AnimeNotFound`] if the anime does not exist
    /// - Returns [`WatchlistError::AlreadyListed`] if the pair already exists
    async fn add(
        &self,
        user_id: UserId,
        input: NewWatchlistEntry,
    ) -> Result<WatchlistEntry, WatchlistError>;

    async fn list(
        &self,
        actor: &AuthUser,
        user_id: UserId,
        status: Option<WatchStatus>,
        sort: SortSpec<WatchlistSort>,
        page: PageSpec,
    ) -> Result<Page<WatchlistEntry>, WatchlistError>;

    async fn update(
        &self,
        user_id: UserId,
        anime_id: AnimeId,
        changes: WatchlistUpdate,
    ) -> Result<WatchlistEntry, WatchlistError>;

    async fn remove(&self, user_id: UserId, anime_id: AnimeId) -> Result<(), WatchlistError>;
}
