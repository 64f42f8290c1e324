//! `SeaORM` implementation of the `WatchlistService` trait.

use crate::db::repositories::watchlist::WatchlistSort;
use crate::db::{Page, PageSpec, SortSpec, Store};
use crate::domain::{AnimeId, AuthUser, UserId, WatchStatus};
use crate::models::watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistUpdate};
use crate::services::watchlist_service::{WatchlistError, WatchlistService};
use async_trait::async_trait;
use std::sync::Arc;

pub struct SeaOrmWatchlistService {
    store: Arc<Store>,
}

impl SeaOrmWatchlistService {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

fn check_rating(rating: Option<i32>) -> Result<(), WatchlistError> {
    match rating {
        Some(r) if !(1..=5).contains(&r) => Err(WatchlistError::Validation(
            "rating must be between 1 and 5".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_progress(progress: Option<i32>) -> Result<(), WatchlistError> {
    match progress {
        Some(p) if p < 0 => Err(WatchlistError::Validation(
            "progress cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

#[async_trait]
impl WatchlistService for SeaOrmWatchlistService {
    async fn add(
        &self,
        user_id: UserId,
        input: NewWatchlistEntry,
    ) -> Result<WatchlistEntry, WatchlistError> {
        check_rating(input.rating)?;
        check_progress(Some(input.progress))?;

        if !self.store.anime_repo().exists(input.anime_id).await? {
            return Err(WatchlistError::AnimeNotFound(input.anime_id));
        }

        let repo = self.store.watchlist_repo();
        if repo.get(user_id, input.anime_id).await?.is_some() {
            return Err(WatchlistError::AlreadyListed(input.anime_id));
        }

        Ok(repo.add(user_id, &input).await?)
    }

    async fn list(
        &self,
        actor: &AuthUser,
        user_id: UserId,
        status: Option<WatchStatus>,
        sort: SortSpec<WatchlistSort>,
        page: PageSpec,
    ) -> Result<Page<WatchlistEntry>, WatchlistError> {
        if !actor.can_manage(user_id) {
            return Err(WatchlistError::Forbidden(user_id));
        }

        Ok(self
            .store
            .watchlist_repo()
            .list(user_id, status, sort, page)
            .await?)
    }

    async fn update(
        &self,
        user_id: UserId,
        anime_id: AnimeId,
        changes: WatchlistUpdate,
    ) -> Result<WatchlistEntry, WatchlistError> {
        if changes.is_empty() {
            return Err(WatchlistError::Validation(
                "No fields to update".to_string(),
            ));
        }
        check_rating(changes.rating)?;
        check_progress(changes.progress)?;

        self.store
            .watchlist_repo()
            .update(user_id, anime_id, &changes)
            .await?
            .ok_or(WatchlistError::EntryNotFound(anime_id))
    }

    async fn remove(&self, user_id: UserId, anime_id: AnimeId) -> Result<(), WatchlistError> {
        if self.store.watchlist_repo().remove(user_id, anime_id).await? {
            Ok(())
        } else {
            Err(WatchlistError::EntryNotFound(anime_id))
        }
    }
}
