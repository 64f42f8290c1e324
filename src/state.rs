use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AnimeService, AuthService, ForumService, SeaOrmAnimeService, SeaOrmAuthService,
    SeaOrmForumService, SeaOrmUserService, SeaOrmWatchlistService, UserService, WatchlistService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub anime_service: Arc<dyn AnimeService>,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub forum_service: Arc<dyn ForumService>,

    pub watchlist_service: Arc<dyn WatchlistService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_store(config, store))
    }

    /// Wires every service around an already migrated store.
    #[must_use]
    pub fn from_store(config: Config, store: Store) -> Self {
        let config_arc = Arc::new(RwLock::new(config));
        let store_arc = Arc::new(store.clone());

        let anime_service =
            Arc::new(SeaOrmAnimeService::new(store_arc.clone())) as Arc<dyn AnimeService>;
        let auth_service = Arc::new(SeaOrmAuthService::new(
            store_arc.clone(),
            config_arc.clone(),
        )) as Arc<dyn AuthService>;
        let user_service = Arc::new(SeaOrmUserService::new(
            store_arc.clone(),
            config_arc.clone(),
        )) as Arc<dyn UserService>;
        let forum_service =
            Arc::new(SeaOrmForumService::new(store_arc.clone())) as Arc<dyn ForumService>;
        let watchlist_service =
            Arc::new(SeaOrmWatchlistService::new(store_arc)) as Arc<dyn WatchlistService>;

        Self {
            config: config_arc,
            store,
            anime_service,
            auth_service,
            user_service,
            forum_service,
            watchlist_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
