mod create_user;
mod migrate;

pub use create_user::cmd_create_user;
pub use migrate::cmd_migrate;
