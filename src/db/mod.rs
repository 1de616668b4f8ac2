use crate::models::{ShareToken, Video, VideoFilter};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::share::NewShareToken;
pub use repositories::video::NewVideo;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database sees its own empty
        // database, so keep exactly one connection alive for the pool's lifetime.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn video_repo(&self) -> repositories::video::VideoRepository {
        repositories::video::VideoRepository::new(self.conn.clone())
    }

    fn share_repo(&self) -> repositories::share::ShareTokenRepository {
        repositories::share::ShareTokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========== Video Methods ==========

    pub async fn create_video(&self, new: NewVideo) -> Result<Video, DbErr> {
        self.video_repo().create(new).await
    }

    pub async fn get_video(&self, id: i32) -> Result<Option<Video>> {
        self.video_repo().get(id).await
    }

    pub async fn list_videos(&self, filter: VideoFilter) -> Result<Vec<Video>> {
        self.video_repo().list(filter).await
    }

    pub async fn video_filenames(&self) -> Result<Vec<String>> {
        self.video_repo().all_filenames().await
    }

    pub async fn update_video(&self, id: i32, title: &str, is_public: bool) -> Result<Option<Video>> {
        self.video_repo().update(id, title, is_public).await
    }

    pub async fn delete_video(&self, id: i32) -> Result<Option<u64>> {
        self.video_repo().delete_with_tokens(id).await
    }

    // ========== Share Token Methods ==========

    pub async fn insert_share_token(&self, new: NewShareToken) -> Result<ShareToken, DbErr> {
        self.share_repo().insert(new).await
    }

    pub async fn get_share_token(&self, id: i32) -> Result<Option<ShareToken>> {
        self.share_repo().get(id).await
    }

    pub async fn find_share_token(&self, token: &str) -> Result<Option<ShareToken>> {
        self.share_repo().find_by_token(token).await
    }

    pub async fn list_share_tokens(&self, video_id: i32) -> Result<Vec<ShareToken>> {
        self.share_repo().list_for_video(video_id).await
    }

    pub async fn increment_share_views(&self, id: i32) -> Result<bool> {
        self.share_repo().increment_views(id).await
    }

    pub async fn toggle_share_token(&self, id: i32) -> Result<Option<bool>> {
        self.share_repo().toggle(id).await
    }

    pub async fn remove_share_token(&self, id: i32) -> Result<bool> {
        self.share_repo().remove(id).await
    }

    // ========== User Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn count_admins(&self) -> Result<u64> {
        self.user_repo().count_admins().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: String,
        is_admin: bool,
    ) -> Result<User, DbErr> {
        self.user_repo()
            .insert(username, password_hash, is_admin)
            .await
    }
}

/// True when the error is a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
