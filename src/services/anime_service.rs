//! Domain service for the anime catalog.

use crate::db::repositories::anime::{AnimeFilter, AnimeSort};
use crate::db::{CascadeError, CascadeReport, Page, PageSpec, SortSpec, StoreError};
use crate::domain::AnimeId;
use crate::models::anime::{Anime, AnimeUpdate, NewAnime};
use thiserror::Error;

/// Domain errors for anime operations.
#[derive(Debug, Error)]
pub enum AnimeError {
    #[error("Anime not found: {0}")]
    NotFound(AnimeId),

    #[error("Invalid anime data: {0}")]
    InvalidData(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for AnimeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) | StoreError::Busy(msg) => Self::Conflict(msg),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<CascadeError> for AnimeError {
    fn from(err: CascadeError) -> Self {
        match err {
            CascadeError::NotFound(target) => Self::NotFound(AnimeId::new(target.id())),
            CascadeError::Conflict(_) => Self::Conflict(err.to_string()),
            CascadeError::OperationFailed { .. } => Self::Database(err.to_string()),
        }
    }
}

/// Domain service trait for anime operations.
///
/// # Examples
///
/// ```rust,ignore
/// use anihub::services::{AnimeService, AnimeError};
/// use anihub::domain::AnimeId;
/// use std::sync::Arc;
///
/// async fn example(service: Arc<dyn AnimeService>) -> Result<(), AnimeError> {
///     let anime = service.get_anime(AnimeId::new(1)).await?;
///     println!("{}", anime.title);
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait AnimeService: Send + Sync {
    /// Lists the catalog with optional filters, a validated sort and a page window.
    async fn list_anime(
        &self,
        filter: AnimeFilter,
        sort: SortSpec<AnimeSort>,
        page: PageSpec,
    ) -> Result<Page<Anime>, AnimeError>;

    /// # Errors
    ///
    /// Returns [`AnimeError::NotFound`] if the anime does not exist.
    async fn get_anime(&self, id: AnimeId) -> Result<Anime, AnimeError>;

    async fn create_anime(&self, input: NewAnime) -> Result<Anime, AnimeError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// - Returns [`AnimeError::InvalidData`] if the update carries no fields
    /// - Returns [`AnimeError::NotFound`] if the anime does not exist
    async fn update_anime(&self, id: AnimeId, changes: AnimeUpdate) -> Result<Anime, AnimeError>;

    /// Deletes the anime together with its threads, their comments and all
    /// watchlist entries, atomically.
    ///
    /// # Errors
    ///
    /// - Returns [`AnimeError::NotFound`] if the anime does not exist
    /// - Returns [`AnimeError::Conflict`] if a concurrent writer held the lock
    async fn delete_anime(&self, id: AnimeId) -> Result<CascadeReport, AnimeError>;
}
