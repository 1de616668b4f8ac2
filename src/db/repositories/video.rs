use crate::entities::{prelude::*, share_tokens, videos};
use crate::models::{Video, VideoFilter};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

/// Fields of a video row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub filename: String,
    pub is_public: bool,
    pub uploader_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Repository for video records
pub struct VideoRepository {
    conn: DatabaseConnection,
}

impl VideoRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new: NewVideo) -> Result<Video, DbErr> {
        let active_model = videos::ActiveModel {
            title: Set(new.title),
            filename: Set(new.filename),
            is_public: Set(new.is_public),
            uploader_id: Set(new.uploader_id),
            created_at: Set(new.created_at.to_rfc3339()),
            ..Default::default()
        };

        let model = Videos::insert(active_model)
            .exec_with_returning(&self.conn)
            .await?;

        info!("Created video {} ({})", model.id, model.filename);
        Ok(Video::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Video>> {
        let result = Videos::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query video by ID")?;
        Ok(result.map(Video::from))
    }

    pub async fn list(&self, filter: VideoFilter) -> Result<Vec<Video>> {
        let mut query = Videos::find().order_by_desc(videos::Column::Id);

        if filter == VideoFilter::PublicOnly {
            query = query.filter(videos::Column::IsPublic.eq(true));
        }

        let rows = query.all(&self.conn).await.context("Failed to list videos")?;
        Ok(rows.into_iter().map(Video::from).collect())
    }

    /// Every stored filename referenced by a record.
    pub async fn all_filenames(&self) -> Result<Vec<String>> {
        let names = Videos::find()
            .select_only()
            .column(videos::Column::Filename)
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("Failed to list video filenames")?;
        Ok(names)
    }

    pub async fn update(&self, id: i32, title: &str, is_public: bool) -> Result<Option<Video>> {
        let Some(model) = Videos::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: videos::ActiveModel = model.into();
        active.title = Set(title.to_string());
        active.is_public = Set(is_public);
        let updated = active.update(&self.conn).await?;

        Ok(Some(Video::from(updated)))
    }

    /// Removes the video row together with its share tokens.
    ///
    /// Returns the number of share tokens removed, or `None` when the video did not exist.
    pub async fn delete_with_tokens(&self, id: i32) -> Result<Option<u64>> {
        let txn = self.conn.begin().await?;

        let tokens = ShareTokens::delete_many()
            .filter(share_tokens::Column::VideoId.eq(id))
            .exec(&txn)
            .await?;

        let result = Videos::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        txn.commit().await?;
        Ok(Some(tokens.rows_affected))
    }
}
