use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_requester;
use super::validation::{is_plausible_token, validate_share_id, validate_video_id};
use super::{ApiError, ApiResponse, AppState, MessageResponse, ShareLinkDto, ToggleResponse, VideoDto};
use crate::domain::Requester;
use crate::models::ShareOptions;
use crate::services::{AccessDecision, DenyReason, ShareError, ShareLink};

impl From<ShareError> for ApiError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::Validation(msg) => Self::validation(msg),
            ShareError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            ShareError::Conflict(msg) => Self::Conflict(msg),
            ShareError::Database(msg) => Self::DatabaseError(msg),
            ShareError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// GET /share/{token}
///
/// Landing endpoint for a share link. Counts one view when the link grants access.
pub async fn open_share(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    session: Session,
) -> Result<Json<ApiResponse<VideoDto>>, ApiError> {
    if !is_plausible_token(&token) {
        return Err(ApiError::NotFound("Share link not found".to_string()));
    }

    let share = state
        .share_service()
        .find_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Share link not found".to_string()))?;

    let requester = current_requester(&state, &session).await?;
    let video = state.video_service().get(share.video_id).await?;

    let decision = state
        .access()
        .authorize_view(&video, &requester, Some(&token))
        .await?;

    match decision {
        AccessDecision::Allow(_) => {
            state.access().record_grant(decision).await;
            Ok(Json(ApiResponse::success(VideoDto::from_video(
                video,
                Some(&token),
            ))))
        }
        AccessDecision::Deny(DenyReason::Forbidden) => Err(ApiError::Forbidden(
            "This share link has expired or is no longer active".to_string(),
        )),
        AccessDecision::Deny(reason) => Err(reason.into()),
    }
}

/// GET /admin/videos/{id}/shares
pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ShareLinkDto>>>, ApiError> {
    let video_id = validate_video_id(video_id)?;
    let links = state.share_service().list_for_video(video_id).await?;
    Ok(Json(ApiResponse::success(
        links.into_iter().map(ShareLinkDto::from).collect(),
    )))
}

/// POST /admin/videos/{id}/shares
pub async fn create_share(
    State(state): State<Arc<AppState>>,
    Extension(requester): Extension<Requester>,
    Path(video_id): Path<i32>,
    Json(options): Json<ShareOptions>,
) -> Result<Json<ApiResponse<ShareLinkDto>>, ApiError> {
    let video_id = validate_video_id(video_id)?;
    let creator_id = requester
        .user_id
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let shares = state.share_service();
    let token = shares.create(video_id, options, creator_id).await?;
    let link = ShareLink {
        is_valid: shares.is_valid(&token),
        remaining_views: token.remaining_views(),
        token,
    };

    Ok(Json(ApiResponse::success(ShareLinkDto::from(link))))
}

/// PUT /admin/shares/{id}/toggle
pub async fn toggle_share(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ToggleResponse>>, ApiError> {
    let id = validate_share_id(id)?;
    let is_active = state.share_service().toggle(id).await?;
    Ok(Json(ApiResponse::success(ToggleResponse { id, is_active })))
}

/// DELETE /admin/shares/{id}
pub async fn delete_share(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_share_id(id)?;
    state.share_service().delete(id).await?;
    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Share link {id} deleted"),
    })))
}
