pub mod anime;
pub mod forum;
pub mod user;
pub mod watchlist;
