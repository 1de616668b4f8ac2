use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::share_tokens;

/// Options accepted when creating a share link.
///
/// Both limits are optional; `None` means "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ShareOptions {
    #[serde(default)]
    pub expires_hours: Option<u32>,
    #[serde(default)]
    pub max_views: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareToken {
    pub id: i32,
    pub video_id: i32,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub view_count: i32,
    pub is_active: bool,
    pub created_by: i32,
}

impl ShareToken {
    /// Whether the token grants access at `now`.
    ///
    /// Derived from the row on every call: the link must be active, not past
    /// its expiry, and below its view limit.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }

        if self.is_expired(now) {
            return false;
        }

        if self
            .max_views
            .is_some_and(|max_views| self.view_count >= max_views)
        {
            return false;
        }

        true
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    #[must_use]
    pub fn remaining_views(&self) -> Option<i32> {
        self.max_views
            .map(|max_views| (max_views - self.view_count).max(0))
    }
}

impl From<share_tokens::Model> for ShareToken {
    fn from(model: share_tokens::Model) -> Self {
        Self {
            id: model.id,
            video_id: model.video_id,
            token: model.token,
            created_at: model.created_at,
            expires_at: model.expires_at,
            max_views: model.max_views,
            view_count: model.view_count,
            is_active: model.is_active,
            created_by: model.created_by,
        }
    }
}
