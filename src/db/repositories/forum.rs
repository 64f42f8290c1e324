use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::db::StoreError;
use crate::db::cascade::{self, CascadeError, CascadeReport, CascadeTarget};
use crate::db::query::{ListQuery, Page, PageSpec, SortField, SortSpec, column};
use crate::domain::{AnimeId, CommentId, SortOrder, ThreadId, UserId};
use crate::entities::{forum_comments, forum_threads, prelude::*};
use crate::models::forum::{Comment, NewComment, NewThread, Thread, ThreadUpdate, Vote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSort {
    CreatedAt,
    Title,
    ViewCount,
}

impl SortField for ThreadSort {
    const DEFAULT: Self = Self::CreatedAt;
    const DEFAULT_ORDER: SortOrder = SortOrder::Descending;

    fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "title" => Some(Self::Title),
            "view_count" | "viewCount" => Some(Self::ViewCount),
            _ => None,
        }
    }

    fn expr(self) -> SimpleExpr {
        let col = match self {
            Self::CreatedAt => forum_threads::Column::CreatedAt,
            Self::Title => forum_threads::Column::Title,
            Self::ViewCount => forum_threads::Column::ViewCount,
        };
        Expr::col(column(ForumThreads, col)).into()
    }

    fn tie_breaker() -> SimpleExpr {
        Expr::col(column(ForumThreads, forum_threads::Column::Id)).into()
    }

    fn leading_order() -> Option<(SimpleExpr, Order)> {
        Some((
            Expr::col(column(ForumThreads, forum_threads::Column::IsPinned)).into(),
            Order::Desc,
        ))
    }
}

pub struct ForumRepository {
    conn: DatabaseConnection,
}

impl ForumRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create_thread(
        &self,
        author: UserId,
        input: &NewThread,
    ) -> Result<Thread, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = forum_threads::ActiveModel {
            anime_id: Set(input.anime_id.map(|id| id.value())),
            user_id: Set(author.value()),
            title: Set(input.title.trim().to_string()),
            content: Set(input.content.clone()),
            view_count: Set(0),
            is_pinned: Set(false),
            is_locked: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!(thread_id = model.id, user_id = author.value(), "Created thread");
        Ok(model.into())
    }

    pub async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, StoreError> {
        let model = ForumThreads::find_by_id(id.value()).one(&self.conn).await?;
        Ok(model.map(Thread::from))
    }

    /// Fetches the thread and counts the view.
    pub async fn view_thread(&self, id: ThreadId) -> Result<Option<Thread>, StoreError> {
        let result = ForumThreads::update_many()
            .col_expr(
                forum_threads::Column::ViewCount,
                Expr::col(forum_threads::Column::ViewCount).add(1),
            )
            .filter(forum_threads::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_thread(id).await
    }

    pub async fn list_threads_by_anime(
        &self,
        anime_id: AnimeId,
        sort: SortSpec<ThreadSort>,
        page: PageSpec,
    ) -> Result<Page<Thread>, StoreError> {
        let query = ListQuery::new(sort, page).equals(
            column(ForumThreads, forum_threads::Column::AnimeId),
            anime_id.value(),
        );

        let page = query.fetch(ForumThreads::find(), &self.conn).await?;
        Ok(page.map(Thread::from))
    }

    pub async fn update_thread(
        &self,
        id: ThreadId,
        changes: &ThreadUpdate,
    ) -> Result<Option<Thread>, StoreError> {
        let Some(model) = ForumThreads::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: forum_threads::ActiveModel = model.into();
        if let Some(title) = &changes.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(content) = &changes.content {
            active.content = Set(content.clone());
        }
        if let Some(pinned) = changes.is_pinned {
            active.is_pinned = Set(pinned);
        }
        if let Some(locked) = changes.is_locked {
            active.is_locked = Set(locked);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated.into()))
    }

    /// Removes the thread and all of its comments.
    pub async fn delete_thread(&self, id: ThreadId) -> Result<CascadeReport, CascadeError> {
        cascade::delete_cascade(&self.conn, CascadeTarget::Thread(id)).await
    }

    pub async fn create_comment(
        &self,
        author: UserId,
        input: &NewComment,
    ) -> Result<Comment, StoreError> {
        let active_model = forum_comments::ActiveModel {
            thread_id: Set(input.thread_id.value()),
            user_id: Set(author.value()),
            parent_comment_id: Set(input.parent_comment_id.map(|id| id.value())),
            content: Set(input.content.clone()),
            upvotes: Set(0),
            downvotes: Set(0),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        Ok(model.into())
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let model = ForumComments::find_by_id(id.value()).one(&self.conn).await?;
        Ok(model.map(Comment::from))
    }

    /// Comments of a thread, newest first.
    pub async fn list_comments(&self, thread_id: ThreadId) -> Result<Vec<Comment>, StoreError> {
        let rows = ForumComments::find()
            .filter(forum_comments::Column::ThreadId.eq(thread_id.value()))
            .order_by_desc(forum_comments::Column::CreatedAt)
            .order_by_desc(forum_comments::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    pub async fn vote(&self, id: CommentId, vote: Vote) -> Result<Option<Comment>, StoreError> {
        let col = match vote {
            Vote::Up => forum_comments::Column::Upvotes,
            Vote::Down => forum_comments::Column::Downvotes,
        };

        let result = ForumComments::update_many()
            .col_expr(col, Expr::col(col).add(1))
            .filter(forum_comments::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_comment(id).await
    }

    /// Replies to the removed comment keep existing with their parent cleared.
    pub async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError> {
        let result = ForumComments::delete_by_id(id.value())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::db::testing::{self, Seed};

    async fn seeded() -> (crate::db::Store, ForumRepository) {
        let store = testing::memory_store().await;
        let seed = Seed::new(&store.conn);
        seed.user(2, "vash").await;
        seed.anime(10, "Trigun").await;
        let repo = store.forum_repo();
        (store, repo)
    }

    fn thread(title: &str) -> NewThread {
        NewThread {
            anime_id: Some(AnimeId::new(10)),
            title: title.into(),
            content: "discuss".into(),
        }
    }

    #[tokio::test]
    async fn test_view_increments_counter() {
        let (_store, repo) = seeded().await;
        let created = repo.create_thread(UserId::new(2), &thread("Ep 1")).await.unwrap();

        repo.view_thread(ThreadId::new(created.id)).await.unwrap();
        let viewed = repo
            .view_thread(ThreadId::new(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(viewed.view_count, 2);

        assert!(repo.view_thread(ThreadId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pinned_threads_come_first() {
        let (_store, repo) = seeded().await;
        let first = repo.create_thread(UserId::new(2), &thread("Old news")).await.unwrap();
        repo.create_thread(UserId::new(2), &thread("Fresh")).await.unwrap();

        repo.update_thread(
            ThreadId::new(first.id),
            &ThreadUpdate {
                is_pinned: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = PageSpec::clamp(None, None, &PaginationConfig::default());
        let sort = SortSpec::parse(Some("title"), Some("asc"));
        let result = repo
            .list_threads_by_anime(AnimeId::new(10), sort, page)
            .await
            .unwrap();

        let titles: Vec<_> = result.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Old news", "Fresh"]);
    }

    #[tokio::test]
    async fn test_votes_and_reply_survives_parent_delete() {
        let (_store, repo) = seeded().await;
        let t = repo.create_thread(UserId::new(2), &thread("Ep 2")).await.unwrap();

        let parent = repo
            .create_comment(
                UserId::new(2),
                &NewComment {
                    thread_id: ThreadId::new(t.id),
                    content: "first".into(),
                    parent_comment_id: None,
                },
            )
            .await
            .unwrap();
        let reply = repo
            .create_comment(
                UserId::new(2),
                &NewComment {
                    thread_id: ThreadId::new(t.id),
                    content: "reply".into(),
                    parent_comment_id: Some(CommentId::new(parent.id)),
                },
            )
            .await
            .unwrap();

        let voted = repo
            .vote(CommentId::new(parent.id), Vote::Up)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((voted.upvotes, voted.downvotes), (1, 0));

        assert!(repo.delete_comment(CommentId::new(parent.id)).await.unwrap());
        assert!(!repo.delete_comment(CommentId::new(parent.id)).await.unwrap());

        let orphan = repo.get_comment(CommentId::new(reply.id)).await.unwrap().unwrap();
        assert_eq!(orphan.parent_comment_id, None);
    }
}
