use serde::Serialize;

use crate::entities::videos;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    pub id: i32,
    pub title: String,
    pub filename: String,
    pub is_public: bool,
    pub uploader_id: i32,
    pub created_at: String,
}

impl From<videos::Model> for Video {
    fn from(model: videos::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            filename: model.filename,
            is_public: model.is_public,
            uploader_id: model.uploader_id,
            created_at: model.created_at,
        }
    }
}

/// Which videos a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFilter {
    PublicOnly,
    All,
}
