//! Allow/deny decisions for viewing and streaming videos.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::Requester;
use crate::models::Video;
use crate::services::share_service::{ShareError, ShareService};
use crate::storage::{FileStore, StorageError};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRoute {
    Public,
    Admin,
    /// Granted through the share link with this id.
    ShareToken(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Forbidden,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(AccessRoute),
    Deny(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

#[derive(Debug, Clone, Copy)]
enum AccessRule {
    PublicVideo,
    AdminRequester,
    ValidShareToken,
}

/// Evaluated in order; the first rule that grants decides.
const VIEW_RULES: [AccessRule; 3] = [
    AccessRule::PublicVideo,
    AccessRule::AdminRequester,
    AccessRule::ValidShareToken,
];

#[derive(Clone)]
pub struct AccessGateway {
    shares: Arc<dyn ShareService>,
    files: Arc<dyn FileStore>,
}

impl AccessGateway {
    pub fn new(shares: Arc<dyn ShareService>, files: Arc<dyn FileStore>) -> Self {
        Self { shares, files }
    }

    /// Decides whether `requester` may see `video`.
    ///
    /// Unauthorized callers always get [`DenyReason::Forbidden`], never a hint
    /// about whether the video or its file exists.
    pub async fn authorize_view(
        &self,
        video: &Video,
        requester: &Requester,
        presented_token: Option<&str>,
    ) -> Result<AccessDecision, AccessError> {
        for rule in VIEW_RULES {
            if let Some(route) = self
                .apply(rule, video, requester, presented_token)
                .await?
            {
                debug!("Video {} allowed via {:?}", video.id, route);
                return Ok(AccessDecision::Allow(route));
            }
        }

        Ok(AccessDecision::Deny(DenyReason::Forbidden))
    }

    /// Same rules as [`Self::authorize_view`], then requires the file to exist.
    pub async fn authorize_stream(
        &self,
        video: &Video,
        requester: &Requester,
        presented_token: Option<&str>,
    ) -> Result<AccessDecision, AccessError> {
        let decision = self
            .authorize_view(video, requester, presented_token)
            .await?;

        if decision.is_allowed() && !self.files.exists(&video.filename).await? {
            return Ok(AccessDecision::Deny(DenyReason::NotFound));
        }

        Ok(decision)
    }

    /// Counts a view when the grant came from a share link.
    ///
    /// Failures are logged and swallowed; a grant is never revoked after the fact.
    pub async fn record_grant(&self, decision: AccessDecision) {
        if let AccessDecision::Allow(AccessRoute::ShareToken(id)) = decision
            && let Err(e) = self.shares.record_view(id).await
        {
            error!("Failed to record view on share link {}: {}", id, e);
        }
    }

    async fn apply(
        &self,
        rule: AccessRule,
        video: &Video,
        requester: &Requester,
        presented_token: Option<&str>,
    ) -> Result<Option<AccessRoute>, AccessError> {
        let route = match rule {
            AccessRule::PublicVideo => video.is_public.then_some(AccessRoute::Public),
            AccessRule::AdminRequester => {
                (requester.is_authenticated() && requester.is_admin).then_some(AccessRoute::Admin)
            }
            AccessRule::ValidShareToken => {
                let Some(presented) = presented_token.filter(|t| !t.is_empty()) else {
                    return Ok(None);
                };
                self.shares
                    .find_by_token(presented)
                    .await?
                    .filter(|share| share.video_id == video.id && self.shares.is_valid(share))
                    .map(|share| AccessRoute::ShareToken(share.id))
            }
        };

        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewVideo, Store};
    use crate::domain::{ManualClock, SeededRandom};
    use crate::models::ShareOptions;
    use crate::services::SeaOrmShareService;
    use crate::storage::LocalFileStore;
    use bytes::Bytes;
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        gateway: AccessGateway,
        shares: Arc<dyn ShareService>,
        clock: ManualClock,
        files: Arc<LocalFileStore>,
        public: Video,
        private: Video,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let admin = store
            .create_user("admin", "x".to_string(), true)
            .await
            .unwrap();
        let public = store
            .create_video(NewVideo {
                title: "Public".to_string(),
                filename: "public_0000000000000000.mp4".to_string(),
                is_public: true,
                uploader_id: admin.id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let private = store
            .create_video(NewVideo {
                title: "Private".to_string(),
                filename: "private_0000000000000000.mp4".to_string(),
                is_public: false,
                uploader_id: admin.id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let files = Arc::new(LocalFileStore::new(dir.path()));
        files
            .save(&public.filename, Bytes::from_static(b"pub").into())
            .await
            .unwrap();
        files
            .save(&private.filename, Bytes::from_static(b"priv").into())
            .await
            .unwrap();

        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        let shares: Arc<dyn ShareService> = Arc::new(SeaOrmShareService::new(
            store,
            Arc::new(clock.clone()),
            Arc::new(SeededRandom::new(11)),
        ));

        Fixture {
            gateway: AccessGateway::new(shares.clone(), files.clone()),
            shares,
            clock,
            files,
            public,
            private,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_public_video_is_open() {
        let f = fixture().await;
        let decision = f
            .gateway
            .authorize_view(&f.public, &Requester::anonymous(), None)
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Allow(AccessRoute::Public));
    }

    #[tokio::test]
    async fn test_private_video_requires_admin_or_token() {
        let f = fixture().await;

        let anon = f
            .gateway
            .authorize_view(&f.private, &Requester::anonymous(), None)
            .await
            .unwrap();
        assert_eq!(anon, AccessDecision::Deny(DenyReason::Forbidden));

        let user = f
            .gateway
            .authorize_view(&f.private, &Requester::user(2, false), Some("bogus"))
            .await
            .unwrap();
        assert_eq!(user, AccessDecision::Deny(DenyReason::Forbidden));

        let admin = f
            .gateway
            .authorize_view(&f.private, &Requester::user(1, true), None)
            .await
            .unwrap();
        assert_eq!(admin, AccessDecision::Allow(AccessRoute::Admin));
    }

    #[tokio::test]
    async fn test_token_for_other_video_is_denied() {
        let f = fixture().await;
        let share = f
            .shares
            .create(f.public.id, ShareOptions::default(), 1)
            .await
            .unwrap();

        let decision = f
            .gateway
            .authorize_view(&f.private, &Requester::anonymous(), Some(&share.token))
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Deny(DenyReason::Forbidden));
    }

    #[tokio::test]
    async fn test_view_limit_scenario() {
        let f = fixture().await;
        let options = ShareOptions {
            expires_hours: None,
            max_views: Some(2),
        };
        let share = f.shares.create(f.private.id, options, 1).await.unwrap();
        let anon = Requester::anonymous();

        for _ in 0..2 {
            let decision = f
                .gateway
                .authorize_view(&f.private, &anon, Some(&share.token))
                .await
                .unwrap();
            assert_eq!(decision, AccessDecision::Allow(AccessRoute::ShareToken(share.id)));
            f.gateway.record_grant(decision).await;
        }

        let third = f
            .gateway
            .authorize_view(&f.private, &anon, Some(&share.token))
            .await
            .unwrap();
        assert_eq!(third, AccessDecision::Deny(DenyReason::Forbidden));
        assert_eq!(f.shares.get(share.id).await.unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_denied() {
        let f = fixture().await;
        let options = ShareOptions {
            expires_hours: Some(1),
            max_views: None,
        };
        let share = f.shares.create(f.private.id, options, 1).await.unwrap();
        let anon = Requester::anonymous();

        assert!(
            f.gateway
                .authorize_view(&f.private, &anon, Some(&share.token))
                .await
                .unwrap()
                .is_allowed()
        );

        f.clock.advance(Duration::hours(1));
        assert!(
            !f.gateway
                .authorize_view(&f.private, &anon, Some(&share.token))
                .await
                .unwrap()
                .is_allowed()
        );
    }

    #[tokio::test]
    async fn test_stream_hides_missing_file_from_strangers() {
        let f = fixture().await;
        f.files.delete(&f.private.filename).await.unwrap();

        let anon = f
            .gateway
            .authorize_stream(&f.private, &Requester::anonymous(), None)
            .await
            .unwrap();
        assert_eq!(anon, AccessDecision::Deny(DenyReason::Forbidden));

        let admin = f
            .gateway
            .authorize_stream(&f.private, &Requester::user(1, true), None)
            .await
            .unwrap();
        assert_eq!(admin, AccessDecision::Deny(DenyReason::NotFound));

        let public = f
            .gateway
            .authorize_stream(&f.public, &Requester::anonymous(), None)
            .await
            .unwrap();
        assert_eq!(public, AccessDecision::Allow(AccessRoute::Public));
    }

    #[tokio::test]
    async fn test_record_grant_ignores_missing_link() {
        let f = fixture().await;
        // Link deleted between the decision and the record
        f.gateway
            .record_grant(AccessDecision::Allow(AccessRoute::ShareToken(404)))
            .await;
        f.gateway
            .record_grant(AccessDecision::Allow(AccessRoute::Public))
            .await;
    }
}
