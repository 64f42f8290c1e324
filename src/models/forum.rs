use serde::{Deserialize, Serialize};

use crate::domain::{AnimeId, CommentId, ThreadId};
use crate::entities::{forum_comments, forum_threads};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Thread {
    pub id: i32,
    pub anime_id: Option<i32>,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub view_count: i32,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<forum_threads::Model> for Thread {
    fn from(model: forum_threads::Model) -> Self {
        Self {
            id: model.id,
            anime_id: model.anime_id,
            user_id: model.user_id,
            title: model.title,
            content: model.content,
            view_count: model.view_count,
            is_pinned: model.is_pinned,
            is_locked: model.is_locked,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    pub id: i32,
    pub thread_id: i32,
    pub user_id: i32,
    pub parent_comment_id: Option<i32>,
    pub content: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub created_at: String,
}

impl From<forum_comments::Model> for Comment {
    fn from(model: forum_comments::Model) -> Self {
        Self {
            id: model.id,
            thread_id: model.thread_id,
            user_id: model.user_id,
            parent_comment_id: model.parent_comment_id,
            content: model.content,
            upvotes: model.upvotes,
            downvotes: model.downvotes,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewThread {
    pub anime_id: Option<AnimeId>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_locked: Option<bool>,
}

impl ThreadUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.is_pinned.is_none()
            && self.is_locked.is_none()
    }

    /// Pinning and locking are moderation actions.
    #[must_use]
    pub const fn touches_moderation(&self) -> bool {
        self.is_pinned.is_some() || self.is_locked.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub thread_id: ThreadId,
    pub content: String,
    pub parent_comment_id: Option<CommentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}
