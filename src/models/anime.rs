use serde::{Deserialize, Serialize};

use crate::entities::anime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub episodes: Option<i32>,
    pub studio: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<anime::Model> for Anime {
    fn from(model: anime::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            genre: model.genre,
            episodes: model.episodes,
            studio: model.studio,
            rating: model.rating,
            release_date: model.release_date,
            poster_url: model.poster_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Anime {
    /// Genre tags split out of the comma-joined column.
    #[must_use]
    pub fn genres(&self) -> Vec<&str> {
        self.genre
            .as_deref()
            .map(|g| {
                g.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnime {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub episodes: Option<i32>,
    pub studio: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub episodes: Option<i32>,
    pub studio: Option<String>,
    pub rating: Option<f32>,
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
}

impl AnimeUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.genre.is_none()
            && self.episodes.is_none()
            && self.studio.is_none()
            && self.rating.is_none()
            && self.release_date.is_none()
            && self.poster_url.is_none()
    }
}
