//! `SeaORM` implementation of the `ForumService` trait.

use crate::db::repositories::forum::ThreadSort;
use crate::db::{CascadeReport, Page, PageSpec, SortSpec, Store};
use crate::domain::{AnimeId, AuthUser, CommentId, ThreadId, UserId};
use crate::models::forum::{Comment, NewComment, NewThread, Thread, ThreadUpdate, Vote};
use crate::services::forum_service::{ForumError, ForumService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct SeaOrmForumService {
    store: Arc<Store>,
}

impl SeaOrmForumService {
    #[must_use]
    pub const fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    async fn require_thread(&self, id: ThreadId) -> Result<Thread, ForumError> {
        self.store
            .forum_repo()
            .get_thread(id)
            .await?
            .ok_or(ForumError::ThreadNotFound(id))
    }
}

#[async_trait]
impl ForumService for SeaOrmForumService {
    async fn create_thread(
        &self,
        author: &AuthUser,
        input: NewThread,
    ) -> Result<Thread, ForumError> {
        if input.title.trim().is_empty() {
            return Err(ForumError::Validation("title is required".to_string()));
        }
        if input.content.trim().is_empty() {
            return Err(ForumError::Validation("content is required".to_string()));
        }

        if let Some(anime_id) = input.anime_id
            && !self.store.anime_repo().exists(anime_id).await?
        {
            return Err(ForumError::AnimeNotFound(anime_id));
        }

        Ok(self.store.forum_repo().create_thread(author.id, &input).await?)
    }

    async fn list_threads(
        &self,
        anime_id: AnimeId,
        sort: SortSpec<ThreadSort>,
        page: PageSpec,
    ) -> Result<Page<Thread>, ForumError> {
        Ok(self
            .store
            .forum_repo()
            .list_threads_by_anime(anime_id, sort, page)
            .await?)
    }

    async fn view_thread(&self, id: ThreadId) -> Result<Thread, ForumError> {
        self.store
            .forum_repo()
            .view_thread(id)
            .await?
            .ok_or(ForumError::ThreadNotFound(id))
    }

    async fn update_thread(
        &self,
        actor: &AuthUser,
        id: ThreadId,
        changes: ThreadUpdate,
    ) -> Result<Thread, ForumError> {
        if changes.is_empty() {
            return Err(ForumError::Validation("No fields to update".to_string()));
        }
        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ForumError::Validation("title cannot be empty".to_string()));
        }

        let thread = self.require_thread(id).await?;
        let is_author = actor.id == UserId::new(thread.user_id);
        if !is_author && !actor.can_moderate() {
            return Err(ForumError::Forbidden(
                "only the author or a moderator may edit this thread".to_string(),
            ));
        }
        if changes.touches_moderation() && !actor.can_moderate() {
            return Err(ForumError::Forbidden(
                "only moderators may pin or lock threads".to_string(),
            ));
        }

        self.store
            .forum_repo()
            .update_thread(id, &changes)
            .await?
            .ok_or(ForumError::ThreadNotFound(id))
    }

    async fn delete_thread(
        &self,
        actor: &AuthUser,
        id: ThreadId,
    ) -> Result<CascadeReport, ForumError> {
        if !actor.can_moderate() {
            return Err(ForumError::Forbidden(
                "only moderators may delete threads".to_string(),
            ));
        }

        let report = self.store.forum_repo().delete_thread(id).await?;
        info!(
            thread_id = id.value(),
            actor = actor.id.value(),
            rows = report.total(),
            "Deleted thread"
        );
        Ok(report)
    }

    async fn create_comment(
        &self,
        author: &AuthUser,
        input: NewComment,
    ) -> Result<Comment, ForumError> {
        if input.content.trim().is_empty() {
            return Err(ForumError::Validation("content is required".to_string()));
        }

        let thread = self.require_thread(input.thread_id).await?;
        if thread.is_locked {
            return Err(ForumError::ThreadLocked(input.thread_id));
        }

        if let Some(parent_id) = input.parent_comment_id {
            let parent = self
                .store
                .forum_repo()
                .get_comment(parent_id)
                .await?
                .ok_or(ForumError::CommentNotFound(parent_id))?;
            if parent.thread_id != thread.id {
                return Err(ForumError::Validation(
                    "parent comment belongs to a different thread".to_string(),
                ));
            }
        }

        Ok(self
            .store
            .forum_repo()
            .create_comment(author.id, &input)
            .await?)
    }

    async fn list_comments(&self, thread_id: ThreadId) -> Result<Vec<Comment>, ForumError> {
        self.require_thread(thread_id).await?;
        Ok(self.store.forum_repo().list_comments(thread_id).await?)
    }

    async fn vote(&self, id: CommentId, vote: Vote) -> Result<Comment, ForumError> {
        self.store
            .forum_repo()
            .vote(id, vote)
            .await?
            .ok_or(ForumError::CommentNotFound(id))
    }

    async fn delete_comment(&self, actor: &AuthUser, id: CommentId) -> Result<(), ForumError> {
        let repo = self.store.forum_repo();
        let comment = repo
            .get_comment(id)
            .await?
            .ok_or(ForumError::CommentNotFound(id))?;

        if actor.id != UserId::new(comment.user_id) && !actor.can_moderate() {
            return Err(ForumError::Forbidden(
                "only the author or a moderator may delete this comment".to_string(),
            ));
        }

        if !repo.delete_comment(id).await? {
            return Err(ForumError::CommentNotFound(id));
        }
        Ok(())
    }
}
