//! `SeaORM` implementation of the `AnimeService` trait.

use crate::db::repositories::anime::{AnimeFilter, AnimeSort};
use crate::db::{CascadeReport, Page, PageSpec, SortSpec, Store};
use crate::domain::AnimeId;
use crate::models::anime::{Anime, AnimeUpdate, NewAnime};
use crate::services::anime_service::{AnimeError, AnimeService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct SeaOrmAnimeService {
    store: Arc<Store>,
}

impl SeaOrmAnimeService {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnimeService for SeaOrmAnimeService {
    async fn list_anime(
        &self,
        filter: AnimeFilter,
        sort: SortSpec<AnimeSort>,
        page: PageSpec,
    ) -> Result<Page<Anime>, AnimeError> {
        Ok(self.store.anime_repo().list(&filter, sort, page).await?)
    }

    async fn get_anime(&self, id: AnimeId) -> Result<Anime, AnimeError> {
        self.store
            .anime_repo()
            .get(id)
            .await?
            .ok_or(AnimeError::NotFound(id))
    }

    async fn create_anime(&self, input: NewAnime) -> Result<Anime, AnimeError> {
        if input.title.trim().is_empty() {
            return Err(AnimeError::InvalidData("title is required".to_string()));
        }

        Ok(self.store.anime_repo().create(&input).await?)
    }

    async fn update_anime(&self, id: AnimeId, changes: AnimeUpdate) -> Result<Anime, AnimeError> {
        if changes.is_empty() {
            return Err(AnimeError::InvalidData("No fields to update".to_string()));
        }
        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AnimeError::InvalidData("title cannot be empty".to_string()));
        }

        self.store
            .anime_repo()
            .update(id, &changes)
            .await?
            .ok_or(AnimeError::NotFound(id))
    }

    async fn delete_anime(&self, id: AnimeId) -> Result<CascadeReport, AnimeError> {
        let report = self.store.anime_repo().delete(id).await?;
        info!(anime_id = id.value(), rows = report.total(), "Deleted anime");
        Ok(report)
    }
}
