use serde::{Deserialize, Serialize};

use crate::models::Video;
use crate::services::ShareLink;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoDto {
    pub id: i32,
    pub title: String,
    pub is_public: bool,
    pub uploader_id: i32,
    pub created_at: String,
    /// Relative URL the player should load.
    pub stream_url: String,
}

impl VideoDto {
    /// `token` is carried into the stream URL so share link holders can play the file.
    #[must_use]
    pub fn from_video(video: Video, token: Option<&str>) -> Self {
        let stream_url = match token {
            Some(token) => format!("/api/stream/{}?token={}", video.id, token),
            None => format!("/api/stream/{}", video.id),
        };

        Self {
            id: video.id,
            title: video.title,
            is_public: video.is_public,
            uploader_id: video.uploader_id,
            created_at: video.created_at,
            stream_url,
        }
    }
}

/// Admin view of a video, including the stored file name.
#[derive(Debug, Serialize)]
pub struct AdminVideoDto {
    #[serde(flatten)]
    pub video: Video,
    pub stream_url: String,
}

impl From<Video> for AdminVideoDto {
    fn from(video: Video) -> Self {
        Self {
            stream_url: format!("/api/stream/{}", video.id),
            video,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: String,
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct ShareLinkDto {
    #[serde(flatten)]
    pub link: ShareLink,
    /// Relative URL that opens the shared video.
    pub share_url: String,
}

impl From<ShareLink> for ShareLinkDto {
    fn from(link: ShareLink) -> Self {
        Self {
            share_url: format!("/api/share/{}", link.token.token),
            link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: i32,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: Vec<String>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
