use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_requester;
use super::validation::{parse_form_bool, validate_video_id};
use super::{
    AdminVideoDto, ApiError, ApiResponse, AppState, MessageResponse, UpdateVideoRequest, VideoDto,
};
use crate::domain::Requester;
use crate::models::VideoFilter;
use crate::services::{AccessDecision, AccessError, AccessRoute, DenyReason, UploadRequest, VideoError};
use crate::storage::UploadBody;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::Validation(msg) => Self::validation(msg),
            VideoError::NotFound(id) => Self::video_not_found(id),
            VideoError::Conflict(msg) => Self::Conflict(msg),
            VideoError::Storage(e) => Self::StorageError(e.to_string()),
            VideoError::Database(msg) => Self::DatabaseError(msg),
            VideoError::Internal(msg) => Self::internal(msg),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Share(e) => e.into(),
            AccessError::Storage(e) => Self::StorageError(e.to_string()),
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Forbidden => Self::forbidden(),
            DenyReason::NotFound => Self::NotFound("Video file not found".to_string()),
        }
    }
}

/// GET /videos
pub async fn list_public_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<VideoDto>>>, ApiError> {
    let videos = state.video_service().list(VideoFilter::PublicOnly).await?;
    let dtos = videos
        .into_iter()
        .map(|v| VideoDto::from_video(v, None))
        .collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /videos/{id}?token=
///
/// A grant through a share link counts as one view.
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<TokenQuery>,
    session: Session,
) -> Result<Json<ApiResponse<VideoDto>>, ApiError> {
    let id = validate_video_id(id)?;
    let requester = current_requester(&state, &session).await?;
    let video = state.video_service().get(id).await?;

    let decision = state
        .access()
        .authorize_view(&video, &requester, query.token.as_deref())
        .await?;

    match decision {
        AccessDecision::Allow(route) => {
            state.access().record_grant(decision).await;
            let token = match route {
                AccessRoute::ShareToken(_) => query.token.as_deref(),
                AccessRoute::Public | AccessRoute::Admin => None,
            };
            Ok(Json(ApiResponse::success(VideoDto::from_video(video, token))))
        }
        AccessDecision::Deny(reason) => Err(reason.into()),
    }
}

/// GET /admin/videos
pub async fn list_all_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AdminVideoDto>>>, ApiError> {
    let videos = state.video_service().list(VideoFilter::All).await?;
    Ok(Json(ApiResponse::success(
        videos.into_iter().map(AdminVideoDto::from).collect(),
    )))
}

/// POST /admin/videos
///
/// Multipart form with `title`, `is_public` and `file`. A missing `is_public`
/// field means private, as an unchecked checkbox sends nothing. The file is
/// spooled to disk chunk by chunk.
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AdminVideoDto>>, ApiError> {
    let mut title = None;
    let mut is_public = false;
    let mut file = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid upload form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::validation(format!("Invalid title: {e}")))?,
                );
            }
            "is_public" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(format!("Invalid visibility: {e}")))?;
                is_public = parse_form_bool(&value)?;
            }
            "file" => {
                let original_filename = field.file_name().unwrap_or_default().to_string();
                let mut staged = state.files().stage().await.map_err(VideoError::from)?;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?
                {
                    staged.write_chunk(&chunk).await.map_err(VideoError::from)?;
                }
                file = Some((original_filename, staged));
            }
            other => tracing::debug!("Ignoring unknown upload field '{}'", other),
        }
    }

    let (original_filename, staged) = file.ok_or_else(|| ApiError::validation("No file part"))?;
    let uploader_id = requester
        .user_id
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let request = UploadRequest {
        title: title.unwrap_or_default(),
        is_public,
        original_filename,
        data: UploadBody::Staged(staged),
    };

    let video = state.video_service().upload(request, uploader_id).await?;
    Ok(Json(ApiResponse::success(AdminVideoDto::from(video))))
}

/// PUT /admin/videos/{id}
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<ApiResponse<AdminVideoDto>>, ApiError> {
    let id = validate_video_id(id)?;
    let video = state
        .video_service()
        .update(id, &payload.title, payload.is_public)
        .await?;
    Ok(Json(ApiResponse::success(AdminVideoDto::from(video))))
}

/// DELETE /admin/videos/{id}
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_video_id(id)?;
    state.video_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Video {id} deleted"),
    })))
}
