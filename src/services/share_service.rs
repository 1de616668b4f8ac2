//! Domain service for share links.
//!
//! Generates, validates, counts views on, toggles and deletes the opaque
//! tokens that grant access to a single private video.

use serde::Serialize;
use thiserror::Error;

use crate::models::{ShareOptions, ShareToken};

/// Errors specific to share link operations.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ShareError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ShareError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A share link together with its state at the time it was read.
#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    #[serde(flatten)]
    pub token: ShareToken,
    pub is_valid: bool,
    pub remaining_views: Option<i32>,
}

#[async_trait::async_trait]
pub trait ShareService: Send + Sync {
    /// Creates a new link for `video_id`.
    ///
    /// # Errors
    ///
    /// - [`ShareError::NotFound`] if the video does not exist.
    /// - [`ShareError::Validation`] if a limit is zero.
    /// - [`ShareError::Conflict`] if the generated token already exists.
    async fn create(
        &self,
        video_id: i32,
        options: ShareOptions,
        creator_id: i32,
    ) -> Result<ShareToken, ShareError>;

    /// Whether `token` grants access right now, according to the service clock.
    fn is_valid(&self, token: &ShareToken) -> bool;

    async fn find_by_token(&self, token: &str) -> Result<Option<ShareToken>, ShareError>;

    async fn get(&self, id: i32) -> Result<ShareToken, ShareError>;

    /// All links for a video, newest first.
    async fn list_for_video(&self, video_id: i32) -> Result<Vec<ShareLink>, ShareError>;

    /// Counts one view. Persisted immediately and never checked against the cap.
    async fn record_view(&self, id: i32) -> Result<(), ShareError>;

    /// Flips the active flag and returns the new value.
    async fn toggle(&self, id: i32) -> Result<bool, ShareError>;

    async fn delete(&self, id: i32) -> Result<(), ShareError>;
}
