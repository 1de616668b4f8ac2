//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password;
use crate::db::{Store, is_unique_violation};
use crate::services::auth_service::{AuthError, AuthService, UserInfo};
use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .verify_user_password(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        info!("User '{}' logged in", user.username);
        Ok(UserInfo::from(user))
    }

    async fn get_user(&self, id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(user))
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<UserInfo, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        // Argon2 is CPU bound; keep it off the async workers
        let password = password.to_string();
        let security = self.security.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .context("Password hashing task panicked")??;

        let user = self
            .store
            .create_user(username, password_hash, is_admin)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict(username.to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        info!("Created user '{}' (admin: {})", user.username, user.is_admin);
        Ok(UserInfo::from(user))
    }

    async fn ensure_default_admin(&self) -> Result<Option<UserInfo>, AuthError> {
        if self.store.count_admins().await? > 0 {
            return Ok(None);
        }

        let username = self.security.bootstrap_admin_username.clone();
        if self.store.get_user_by_username(&username).await?.is_some() {
            warn!(
                "No admin exists and the bootstrap username '{}' belongs to a regular user; \
                 create an admin with `vidshare create-admin`",
                username
            );
            return Ok(None);
        }

        let password = self.security.bootstrap_admin_password.clone();
        let admin = match self.create_user(&username, &password, true).await {
            Ok(admin) => admin,
            Err(AuthError::Conflict(_)) => {
                warn!("Bootstrap username '{}' was taken concurrently", username);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        warn!(
            "Created default admin '{}'. Change its password before exposing this server!",
            admin.username
        );
        Ok(Some(admin))
    }
}
