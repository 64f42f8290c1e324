pub mod prelude;

pub mod anime;
pub mod forum_comments;
pub mod forum_threads;
pub mod user_anime_list;
pub mod users;
