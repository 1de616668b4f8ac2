use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::domain::{Clock, OsRandom, RandomSource, SystemClock};
use crate::services::{
    AccessGateway, AuthService, SeaOrmAuthService, SeaOrmShareService, SeaOrmVideoService,
    ShareService, VideoService,
};
use crate::storage::{FileStore, LocalFileStore};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub files: Arc<LocalFileStore>,

    pub auth_service: Arc<dyn AuthService>,

    pub video_service: Arc<dyn VideoService>,

    pub share_service: Arc<dyn ShareService>,

    pub access: AccessGateway,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(OsRandom)).await
    }

    /// Builds the state with an explicit clock and random source.
    pub async fn with_sources(
        config: Config,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let files = Arc::new(LocalFileStore::new(&config.storage.upload_path));
        files
            .ensure_exists()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to prepare upload directory: {e}"))?;
        info!("Storing uploads in {}", files.root().display());
        let file_store: Arc<dyn FileStore> = files.clone();

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let share_service = Arc::new(SeaOrmShareService::new(store.clone(), clock.clone(), rng.clone()))
            as Arc<dyn ShareService + Send + Sync + 'static>;

        let video_service = Arc::new(SeaOrmVideoService::new(
            store.clone(),
            file_store.clone(),
            &config.storage.placeholder_name,
            clock,
            rng,
        )) as Arc<dyn VideoService + Send + Sync + 'static>;

        let access = AccessGateway::new(share_service.clone(), file_store);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            files,
            auth_service,
            video_service,
            share_service,
            access,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
