use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// One of `admin`, `moderator`, `user`
    pub role: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub profile_pic: Option<String>,

    /// Random bearer token (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::forum_threads::Entity")]
    ForumThreads,
    #[sea_orm(has_many = "super::forum_comments::Entity")]
    ForumComments,
    #[sea_orm(has_many = "super::user_anime_list::Entity")]
    UserAnimeList,
}

impl Related<super::forum_threads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumThreads.def()
    }
}

impl Related<super::forum_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumComments.def()
    }
}

impl Related<super::user_anime_list::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAnimeList.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
