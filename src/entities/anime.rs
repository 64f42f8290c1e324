use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Comma-joined genre tags, e.g. "Action, Fantasy"
    pub genre: Option<String>,
    pub episodes: Option<i32>,
    pub studio: Option<String>,
    pub rating: Option<f32>,
    /// ISO-8601 date (YYYY-MM-DD)
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::forum_threads::Entity")]
    ForumThreads,
    #[sea_orm(has_many = "super::user_anime_list::Entity")]
    UserAnimeList,
}

impl Related<super::forum_threads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumThreads.def()
    }
}

impl Related<super::user_anime_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAnimeList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
