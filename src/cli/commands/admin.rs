//! Admin account command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, SeaOrmAuthService};

pub async fn cmd_create_admin(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    match auth.create_user(username, password, true).await {
        Ok(user) => {
            println!("✓ Admin user '{}' created (id {})", user.username, user.id);
            Ok(())
        }
        Err(AuthError::Conflict(name)) => {
            println!("User '{name}' already exists.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Failed to create admin: {e}")),
    }
}
