//! `SeaORM` implementation of the `ShareService` trait.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{NewShareToken, Store, is_unique_violation};
use crate::domain::{Clock, RandomSource};
use crate::models::{ShareOptions, ShareToken};
use crate::services::share_service::{ShareError, ShareLink, ShareService};

/// Raw entropy behind every token.
const TOKEN_BYTES: usize = 32;

pub struct SeaOrmShareService {
    store: Store,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
}

impl SeaOrmShareService {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, rng: Arc<dyn RandomSource>) -> Self {
        Self { store, clock, rng }
    }

    fn generate_token(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

fn positive(value: Option<u32>, field: &str) -> Result<Option<u32>, ShareError> {
    match value {
        Some(0) => Err(ShareError::Validation(format!("{field} must be positive"))),
        other => Ok(other),
    }
}

#[async_trait]
impl ShareService for SeaOrmShareService {
    async fn create(
        &self,
        video_id: i32,
        options: ShareOptions,
        creator_id: i32,
    ) -> Result<ShareToken, ShareError> {
        let expires_hours = positive(options.expires_hours, "expires_hours")?;
        let max_views = positive(options.max_views, "max_views")?
            .map(|v| {
                i32::try_from(v)
                    .map_err(|_| ShareError::Validation("max_views is too large".to_string()))
            })
            .transpose()?;

        self.store
            .get_video(video_id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("Video {video_id}")))?;

        let now = self.clock.now();
        let expires_at = expires_hours.map(|h| now + Duration::hours(i64::from(h)));

        let new = NewShareToken {
            video_id,
            token: self.generate_token(),
            created_at: now,
            expires_at,
            max_views,
            created_by: creator_id,
        };

        let share = self.store.insert_share_token(new).await.map_err(|e| {
            if is_unique_violation(&e) {
                ShareError::Conflict("Share token already exists".to_string())
            } else {
                ShareError::from(e)
            }
        })?;

        info!(
            "Created share link {} for video {} (expires: {:?}, max views: {:?})",
            share.id, video_id, share.expires_at, share.max_views
        );
        metrics::counter!("share_links_created_total").increment(1);

        Ok(share)
    }

    fn is_valid(&self, token: &ShareToken) -> bool {
        token.is_valid(self.clock.now())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ShareToken>, ShareError> {
        Ok(self.store.find_share_token(token).await?)
    }

    async fn get(&self, id: i32) -> Result<ShareToken, ShareError> {
        self.store
            .get_share_token(id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("Share link {id}")))
    }

    async fn list_for_video(&self, video_id: i32) -> Result<Vec<ShareLink>, ShareError> {
        self.store
            .get_video(video_id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("Video {video_id}")))?;

        let now = self.clock.now();
        let links = self
            .store
            .list_share_tokens(video_id)
            .await?
            .into_iter()
            .map(|token| ShareLink {
                is_valid: token.is_valid(now),
                remaining_views: token.remaining_views(),
                token,
            })
            .collect();

        Ok(links)
    }

    async fn record_view(&self, id: i32) -> Result<(), ShareError> {
        if !self.store.increment_share_views(id).await? {
            return Err(ShareError::NotFound(format!("Share link {id}")));
        }

        debug!("Recorded view on share link {}", id);
        metrics::counter!("share_views_total").increment(1);
        Ok(())
    }

    async fn toggle(&self, id: i32) -> Result<bool, ShareError> {
        let is_active = self
            .store
            .toggle_share_token(id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("Share link {id}")))?;

        info!("Share link {} is now {}", id, if is_active { "active" } else { "inactive" });
        Ok(is_active)
    }

    async fn delete(&self, id: i32) -> Result<(), ShareError> {
        if !self.store.remove_share_token(id).await? {
            return Err(ShareError::NotFound(format!("Share link {id}")));
        }

        info!("Deleted share link {}", id);
        Ok(())
    }
}
