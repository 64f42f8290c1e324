use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::db::StoreError;
use crate::db::query::{ListQuery, Page, PageSpec, SortField, SortSpec, column};
use crate::domain::{AnimeId, SortOrder, UserId, WatchStatus};
use crate::entities::{anime, prelude::*, user_anime_list};
use crate::models::watchlist::{NewWatchlistEntry, WatchlistEntry, WatchlistUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistSort {
    UpdatedAt,
    Title,
    Rating,
}

impl SortField for WatchlistSort {
    const DEFAULT: Self = Self::UpdatedAt;
    const DEFAULT_ORDER: SortOrder = SortOrder::Descending;

    fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    fn expr(self) -> SimpleExpr {
        // Title lives on the joined anime row
        let col = match self {
            Self::UpdatedAt => column(UserAnimeList, user_anime_list::Column::UpdatedAt),
            Self::Title => column(Anime, anime::Column::Title),
            Self::Rating => column(UserAnimeList, user_anime_list::Column::Rating),
        };
        Expr::col(col).into()
    }

    fn tie_breaker() -> SimpleExpr {
        Expr::col(column(UserAnimeList, user_anime_list::Column::AnimeId)).into()
    }
}

pub struct WatchlistRepository {
    conn: DatabaseConnection,
}

impl WatchlistRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(
        &self,
        user_id: UserId,
        anime_id: AnimeId,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        let row = UserAnimeList::find_by_id((user_id.value(), anime_id.value()))
            .find_also_related(Anime)
            .one(&self.conn)
            .await?;

        Ok(row.map(|(entry, anime)| WatchlistEntry::from_parts(entry, anime)))
    }

    /// Inserts a new entry. An existing `(user, anime)` pair is a conflict and
    /// is left unchanged.
    pub async fn add(
        &self,
        user_id: UserId,
        input: &NewWatchlistEntry,
    ) -> Result<WatchlistEntry, StoreError> {
        if self.get(user_id, input.anime_id).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "anime {} is already on the watchlist",
                input.anime_id
            )));
        }

        let active_model = user_anime_list::ActiveModel {
            user_id: Set(user_id.value()),
            anime_id: Set(input.anime_id.value()),
            status: Set(input.status.as_str().to_string()),
            rating: Set(input.rating),
            progress: Set(input.progress),
            notes: Set(input.notes.clone()),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        UserAnimeList::insert(active_model)
            .exec_without_returning(&self.conn)
            .await?;

        info!(
            user_id = user_id.value(),
            anime_id = input.anime_id.value(),
            "Added watchlist entry"
        );

        self.get(user_id, input.anime_id)
            .await?
            .ok_or_else(|| StoreError::Internal("watchlist entry vanished after insert".into()))
    }

    pub async fn list(
        &self,
        user_id: UserId,
        status: Option<WatchStatus>,
        sort: SortSpec<WatchlistSort>,
        page: PageSpec,
    ) -> Result<Page<WatchlistEntry>, StoreError> {
        let query = ListQuery::new(sort, page)
            .equals(
                column(UserAnimeList, user_anime_list::Column::UserId),
                user_id.value(),
            )
            .equals_opt(
                column(UserAnimeList, user_anime_list::Column::Status),
                status.map(WatchStatus::as_str),
            );

        let select = UserAnimeList::find().find_also_related(Anime);
        let page = query.fetch(select, &self.conn).await?;
        Ok(page.map(|(entry, anime)| WatchlistEntry::from_parts(entry, anime)))
    }

    pub async fn update(
        &self,
        user_id: UserId,
        anime_id: AnimeId,
        changes: &WatchlistUpdate,
    ) -> Result<Option<WatchlistEntry>, StoreError> {
        let Some(model) = UserAnimeList::find_by_id((user_id.value(), anime_id.value()))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut active: user_anime_list::ActiveModel = model.into();
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(rating) = changes.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(progress) = changes.progress {
            active.progress = Set(progress);
        }
        if let Some(notes) = &changes.notes {
            active.notes = Set(Some(notes.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        self.get(user_id, anime_id).await
    }

    pub async fn remove(&self, user_id: UserId, anime_id: AnimeId) -> Result<bool, StoreError> {
        let result = UserAnimeList::delete_by_id((user_id.value(), anime_id.value()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
