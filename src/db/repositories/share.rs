use crate::entities::{prelude::*, share_tokens};
use crate::models::ShareToken;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};

/// Fields of a share token row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewShareToken {
    pub video_id: i32,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub created_by: i32,
}

/// Repository for share token rows
pub struct ShareTokenRepository {
    conn: DatabaseConnection,
}

impl ShareTokenRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the raw [`DbErr`] so a token collision can be reported as a conflict.
    pub async fn insert(&self, new: NewShareToken) -> Result<ShareToken, DbErr> {
        let active_model = share_tokens::ActiveModel {
            video_id: Set(new.video_id),
            token: Set(new.token),
            created_at: Set(new.created_at),
            expires_at: Set(new.expires_at),
            max_views: Set(new.max_views),
            view_count: Set(0),
            is_active: Set(true),
            created_by: Set(new.created_by),
            ..Default::default()
        };

        let model = ShareTokens::insert(active_model)
            .exec_with_returning(&self.conn)
            .await?;
        Ok(ShareToken::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<ShareToken>> {
        let row = ShareTokens::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query share token by ID")?;
        Ok(row.map(ShareToken::from))
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<ShareToken>> {
        let row = ShareTokens::find()
            .filter(share_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query share token")?;
        Ok(row.map(ShareToken::from))
    }

    pub async fn list_for_video(&self, video_id: i32) -> Result<Vec<ShareToken>> {
        let rows = ShareTokens::find()
            .filter(share_tokens::Column::VideoId.eq(video_id))
            .order_by_desc(share_tokens::Column::CreatedAt)
            .order_by_desc(share_tokens::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list share tokens")?;
        Ok(rows.into_iter().map(ShareToken::from).collect())
    }

    /// Adds one to the view counter in a single statement.
    pub async fn increment_views(&self, id: i32) -> Result<bool> {
        let result = ShareTokens::update_many()
            .col_expr(
                share_tokens::Column::ViewCount,
                Expr::col(share_tokens::Column::ViewCount).add(1),
            )
            .filter(share_tokens::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record share view")?;

        Ok(result.rows_affected > 0)
    }

    /// Flips the active flag and returns the new value.
    pub async fn toggle(&self, id: i32) -> Result<Option<bool>> {
        let Some(model) = ShareTokens::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let enabled = !model.is_active;
        let mut active: share_tokens::ActiveModel = model.into();
        active.is_active = Set(enabled);
        active.update(&self.conn).await?;

        Ok(Some(enabled))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = ShareTokens::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}
