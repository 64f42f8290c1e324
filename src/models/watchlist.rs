use serde::{Deserialize, Serialize};

use crate::domain::{AnimeId, WatchStatus};
use crate::entities::{anime, user_anime_list};

/// Anime columns shown alongside a watchlist entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnimeSummary {
    pub title: String,
    pub episodes: Option<i32>,
    pub poster_url: Option<String>,
    pub rating: Option<f32>,
}

impl From<anime::Model> for AnimeSummary {
    fn from(model: anime::Model) -> Self {
        Self {
            title: model.title,
            episodes: model.episodes,
            poster_url: model.poster_url,
            rating: model.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchlistEntry {
    pub user_id: i32,
    pub anime_id: i32,
    pub status: WatchStatus,
    pub rating: Option<i32>,
    pub progress: i32,
    pub notes: Option<String>,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime: Option<AnimeSummary>,
}

impl WatchlistEntry {
    #[must_use]
    pub fn from_parts(entry: user_anime_list::Model, anime: Option<anime::Model>) -> Self {
        Self {
            user_id: entry.user_id,
            anime_id: entry.anime_id,
            status: entry.status.parse().unwrap_or(WatchStatus::PlanToWatch),
            rating: entry.rating,
            progress: entry.progress,
            notes: entry.notes,
            updated_at: entry.updated_at,
            anime: anime.map(AnimeSummary::from),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWatchlistEntry {
    pub anime_id: AnimeId,
    #[serde(default = "default_status")]
    pub status: WatchStatus,
    pub rating: Option<i32>,
    #[serde(default)]
    pub progress: i32,
    pub notes: Option<String>,
}

const fn default_status() -> WatchStatus {
    WatchStatus::PlanToWatch
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistUpdate {
    pub status: Option<WatchStatus>,
    pub rating: Option<i32>,
    pub progress: Option<i32>,
    pub notes: Option<String>,
}

impl WatchlistUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.rating.is_none()
            && self.progress.is_none()
            && self.notes.is_none()
    }
}
