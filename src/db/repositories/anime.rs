use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use tracing::info;

use crate::db::StoreError;
use crate::db::cascade::{self, CascadeError, CascadeReport, CascadeTarget};
use crate::db::query::{ListQuery, Page, PageSpec, SortField, SortSpec, column};
use crate::domain::{AnimeId, SortOrder};
use crate::entities::{anime, prelude::*};
use crate::models::anime::{Anime as AnimeModel, AnimeUpdate, NewAnime};

/// Optional filters accepted by the anime list.
#[derive(Debug, Clone, Default)]
pub struct AnimeFilter {
    pub genre: Option<String>,
    pub studio: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimeSort {
    Title,
    Episodes,
    Rating,
    ReleaseDate,
    CreatedAt,
}

impl SortField for AnimeSort {
    const DEFAULT: Self = Self::Title;
    const DEFAULT_ORDER: SortOrder = SortOrder::Ascending;

    fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "title" => Some(Self::Title),
            "episodes" => Some(Self::Episodes),
            "rating" => Some(Self::Rating),
            "release_date" | "releaseDate" => Some(Self::ReleaseDate),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn expr(self) -> SimpleExpr {
        let col = match self {
            Self::Title => anime::Column::Title,
            Self::Episodes => anime::Column::Episodes,
            Self::Rating => anime::Column::Rating,
            Self::ReleaseDate => anime::Column::ReleaseDate,
            Self::CreatedAt => anime::Column::CreatedAt,
        };
        Expr::col(column(Anime, col)).into()
    }

    fn tie_breaker() -> SimpleExpr {
        Expr::col(column(Anime, anime::Column::Id)).into()
    }
}

pub struct AnimeRepository {
    conn: DatabaseConnection,
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        filter: &AnimeFilter,
        sort: SortSpec<AnimeSort>,
        page: PageSpec,
    ) -> Result<Page<AnimeModel>, StoreError> {
        let query = ListQuery::new(sort, page)
            .contains(column(Anime, anime::Column::Genre), filter.genre.as_deref())
            .contains(column(Anime, anime::Column::Studio), filter.studio.as_deref())
            .contains(column(Anime, anime::Column::Title), filter.search.as_deref());

        let page = query.fetch(Anime::find(), &self.conn).await?;
        Ok(page.map(AnimeModel::from))
    }

    pub async fn get(&self, id: AnimeId) -> Result<Option<AnimeModel>, StoreError> {
        let model = Anime::find_by_id(id.value()).one(&self.conn).await?;
        Ok(model.map(AnimeModel::from))
    }

    pub async fn exists(&self, id: AnimeId) -> Result<bool, StoreError> {
        let count = Anime::find_by_id(id.value()).count(&self.conn).await?;
        Ok(count > 0)
    }

    pub async fn create(&self, input: &NewAnime) -> Result<AnimeModel, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = anime::ActiveModel {
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.clone()),
            genre: Set(input.genre.clone()),
            episodes: Set(input.episodes),
            studio: Set(input.studio.clone()),
            rating: Set(input.rating),
            release_date: Set(input.release_date.clone()),
            poster_url: Set(input.poster_url.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!(anime_id = model.id, title = %model.title, "Created anime");
        Ok(model.into())
    }

    /// Applies the non-empty fields of `changes`. Returns `None` if the anime does not exist.
    pub async fn update(
        &self,
        id: AnimeId,
        changes: &AnimeUpdate,
    ) -> Result<Option<AnimeModel>, StoreError> {
        let Some(model) = Anime::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: anime::ActiveModel = model.into();
        if let Some(title) = &changes.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = &changes.description {
            active.description = Set(Some(description.clone()));
        }
        if let Some(genre) = &changes.genre {
            active.genre = Set(Some(genre.clone()));
        }
        if let Some(episodes) = changes.episodes {
            active.episodes = Set(Some(episodes));
        }
        if let Some(studio) = &changes.studio {
            active.studio = Set(Some(studio.clone()));
        }
        if let Some(rating) = changes.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(release_date) = &changes.release_date {
            active.release_date = Set(Some(release_date.clone()));
        }
        if let Some(poster_url) = &changes.poster_url {
            active.poster_url = Set(Some(poster_url.clone()));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated.into()))
    }

    /// Removes the anime with its threads, their comments and every watchlist entry.
    pub async fn delete(&self, id: AnimeId) -> Result<CascadeReport, CascadeError> {
        cascade::delete_cascade(&self.conn, CascadeTarget::Anime(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::db::testing::{self, Seed};
    use std::collections::HashSet;

    fn page(page: i64, limit: i64) -> PageSpec {
        PageSpec::clamp(Some(page), Some(limit), &PaginationConfig::default())
    }

    async fn seeded() -> AnimeRepository {
        let store = testing::memory_store().await;
        let seed = Seed::new(&store.conn);
        seed.anime(1, "Naruto").await;
        seed.anime(2, "Bleach").await;
        seed.anime(3, "One Piece").await;
        seed.anime(4, "Akira").await;
        seed.anime(5, "Monster").await;
        store.anime_repo()
    }

    #[tokio::test]
    async fn test_first_page_sorted_by_title() {
        let repo = seeded().await;
        let sort = SortSpec::parse(Some("title"), Some("ASC"));

        let result = repo
            .list(&AnimeFilter::default(), sort, page(1, 2))
            .await
            .unwrap();

        let titles: Vec<_> = result.items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Akira", "Bleach"]);
        assert_eq!(result.pagination.total, 5);
        assert_eq!(result.pagination.total_pages, 3);
        assert!(result.pagination.has_next);
        assert!(!result.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_pages_cover_every_row_once() {
        let repo = seeded().await;
        let mut seen = HashSet::new();

        for p in 1..=3 {
            let result = repo
                .list(&AnimeFilter::default(), SortSpec::default(), page(p, 2))
                .await
                .unwrap();
            for anime in result.items {
                assert!(seen.insert(anime.id), "anime {} returned twice", anime.id);
            }
        }

        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let repo = seeded().await;
        let result = repo
            .list(&AnimeFilter::default(), SortSpec::default(), page(7, 2))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.pagination.total, 5);
        assert!(!result.pagination.has_next);
        assert!(result.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_page_at_i64_max_is_empty() {
        let repo = seeded().await;
        let result = repo
            .list(&AnimeFilter::default(), SortSpec::default(), page(i64::MAX, 10))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.pagination.page, i64::MAX.unsigned_abs());
        assert_eq!(result.pagination.total, 5);
        assert_eq!(result.pagination.total_pages, 1);
        assert!(!result.pagination.has_next);
        assert!(result.pagination.has_prev);
    }

    #[tokio::test]
    async fn test_injection_attempt_matches_literally() {
        let repo = seeded().await;
        let filter = AnimeFilter {
            search: Some("' OR '1'='1".into()),
            ..Default::default()
        };

        let result = repo
            .list(&filter, SortSpec::default(), page(1, 10))
            .await
            .unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.pagination.total, 0);

        // Anime table is intact
        let all = repo
            .list(&AnimeFilter::default(), SortSpec::default(), page(1, 10))
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 5);
    }

    #[tokio::test]
    async fn test_wildcards_in_search_are_literal() {
        let repo = seeded().await;
        let filter = AnimeFilter {
            search: Some("%".into()),
            ..Default::default()
        };
        let result = repo
            .list(&filter, SortSpec::default(), page(1, 10))
            .await
            .unwrap();
        assert_eq!(result.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let repo = seeded().await;
        let filter = AnimeFilter {
            search: Some("PIECE".into()),
            ..Default::default()
        };
        let result = repo
            .list(&filter, SortSpec::default(), page(1, 10))
            .await
            .unwrap();
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "One Piece");
    }

    #[tokio::test]
    async fn test_non_ascii_search_matches_exact_case() {
        let store = testing::memory_store().await;
        Seed::new(&store.conn).anime(1, "Ōkami Kakushi").await;
        let repo = store.anime_repo();

        for needle in ["Ōkami", "Ōkami Kakushi", "KAKUSHI", "ŌKAMI"] {
            let filter = AnimeFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            let result = repo
                .list(&filter, SortSpec::default(), page(1, 10))
                .await
                .unwrap();
            let titles: Vec<_> = result.items.iter().map(|a| a.title.as_str()).collect();
            assert_eq!(titles, ["Ōkami Kakushi"], "search {needle:?}");
        }
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let repo = seeded().await;
        let changes = AnimeUpdate {
            episodes: Some(220),
            ..Default::default()
        };

        let updated = repo.update(AnimeId::new(1), &changes).await.unwrap().unwrap();
        assert_eq!(updated.episodes, Some(220));
        assert_eq!(updated.title, "Naruto");

        assert!(repo.update(AnimeId::new(404), &changes).await.unwrap().is_none());
    }
}
