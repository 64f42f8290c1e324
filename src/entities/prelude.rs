pub use super::anime::Entity as Anime;
pub use super::forum_comments::Entity as ForumComments;
pub use super::forum_threads::Entity as ForumThreads;
pub use super::user_anime_list::Entity as UserAnimeList;
pub use super::users::Entity as Users;
