//! Domain service for uploaded videos.
//!
//! Keeps the record store and the upload directory in step: uploads write the
//! file before the record, deletes remove the file before the record.

use thiserror::Error;

use crate::library::{NamingError, ReconcileReport};
use crate::models::{Video, VideoFilter};
use crate::storage::{StorageError, UploadBody};

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Video not found: {0}")]
    NotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for VideoError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for VideoError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<NamingError> for VideoError {
    fn from(err: NamingError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A file received from an upload form.
#[derive(Debug)]
pub struct UploadRequest {
    pub title: String,
    pub is_public: bool,
    /// Name supplied by the client; only used to derive the stored name.
    pub original_filename: String,
    pub data: UploadBody,
}

#[async_trait::async_trait]
pub trait VideoService: Send + Sync {
    /// Stores the file and creates its record.
    ///
    /// # Errors
    ///
    /// - [`VideoError::Validation`] for an empty title or unsupported file type.
    /// - [`VideoError::Conflict`] if the generated name is already taken; the
    ///   existing file is left untouched.
    /// - [`VideoError::Storage`] if the file cannot be written; no record is created.
    async fn upload(&self, request: UploadRequest, uploader_id: i32) -> Result<Video, VideoError>;

    async fn get(&self, id: i32) -> Result<Video, VideoError>;

    /// Newest first.
    async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>, VideoError>;

    /// Changes title and visibility.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::Validation`] for an empty or whitespace-only title.
    async fn update(&self, id: i32, title: &str, is_public: bool) -> Result<Video, VideoError>;

    /// Removes the file (if still present), the record and its share links.
    async fn delete(&self, id: i32) -> Result<(), VideoError>;

    /// Deletes files in the upload directory that no record references.
    async fn cleanup_orphans(&self) -> Result<ReconcileReport, VideoError>;
}
