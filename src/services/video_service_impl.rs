//! `SeaORM` implementation of the `VideoService` trait.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{NewVideo, Store, is_unique_violation};
use crate::domain::{Clock, RandomSource};
use crate::library::{OrphanReconciler, ReconcileReport, stored_filename};
use crate::models::{Video, VideoFilter};
use crate::services::video_service::{UploadRequest, VideoError, VideoService};
use crate::storage::{FileStore, StorageError};

pub struct SeaOrmVideoService {
    store: Store,
    files: Arc<dyn FileStore>,
    reconciler: OrphanReconciler,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
}

impl SeaOrmVideoService {
    #[must_use]
    pub fn new(
        store: Store,
        files: Arc<dyn FileStore>,
        placeholder: &str,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        let reconciler = OrphanReconciler::new(files.clone(), placeholder);
        Self {
            store,
            files,
            reconciler,
            clock,
            rng,
        }
    }
}

fn clean_title(title: &str) -> Result<&str, VideoError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(VideoError::Validation("Title is required".to_string()));
    }
    Ok(title)
}

#[async_trait]
impl VideoService for SeaOrmVideoService {
    async fn upload(&self, request: UploadRequest, uploader_id: i32) -> Result<Video, VideoError> {
        let title = clean_title(&request.title)?;
        if request.original_filename.trim().is_empty() {
            return Err(VideoError::Validation("No file selected".to_string()));
        }

        let filename = stored_filename(&request.original_filename, self.rng.as_ref())?;
        let size = request.data.len();

        // Nothing was written on a taken name, so there is nothing to compensate
        self.files
            .save(&filename, request.data)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists(name) => {
                    VideoError::Conflict(format!("File {name} already exists"))
                }
                other => other.into(),
            })?;

        let new = NewVideo {
            title: title.to_string(),
            filename: filename.clone(),
            is_public: request.is_public,
            uploader_id,
            created_at: self.clock.now(),
        };

        let video = match self.store.create_video(new).await {
            Ok(video) => video,
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&filename).await {
                    warn!("Failed to remove {} after aborted upload: {}", filename, cleanup);
                }
                if is_unique_violation(&e) {
                    return Err(VideoError::Conflict(format!("File {filename} already exists")));
                }
                return Err(e.into());
            }
        };

        info!(
            "Uploaded video {} '{}' as {} ({} bytes)",
            video.id, video.title, video.filename, size
        );
        metrics::counter!("videos_uploaded_total").increment(1);

        if let Err(e) = self.cleanup_orphans().await {
            warn!("Orphan cleanup after upload failed: {}", e);
        }

        Ok(video)
    }

    async fn get(&self, id: i32) -> Result<Video, VideoError> {
        self.store
            .get_video(id)
            .await?
            .ok_or(VideoError::NotFound(id))
    }

    async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>, VideoError> {
        Ok(self.store.list_videos(filter).await?)
    }

    async fn update(&self, id: i32, title: &str, is_public: bool) -> Result<Video, VideoError> {
        let title = clean_title(title)?;

        let video = self
            .store
            .update_video(id, title, is_public)
            .await?
            .ok_or(VideoError::NotFound(id))?;

        info!("Updated video {} (public: {})", id, is_public);
        Ok(video)
    }

    async fn delete(&self, id: i32) -> Result<(), VideoError> {
        let video = self.get(id).await?;

        if let Err(e) = self.files.delete(&video.filename).await {
            warn!("Could not remove file {} for video {}: {}", video.filename, id, e);
        }

        let tokens = self
            .store
            .delete_video(id)
            .await?
            .ok_or(VideoError::NotFound(id))?;

        info!("Deleted video {} and {} share links", id, tokens);
        Ok(())
    }

    async fn cleanup_orphans(&self) -> Result<ReconcileReport, VideoError> {
        let known: HashSet<String> = self.store.video_filenames().await?.into_iter().collect();
        Ok(self.reconciler.reconcile(&known).await?)
    }
}
