use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{AccessGateway, AuthService, ShareService, VideoService};
use crate::state::SharedState;
use crate::storage::LocalFileStore;

pub mod auth;
mod error;
mod observability;
mod shares;
mod stream;
mod tasks;
mod types;
mod validation;
mod videos;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn files(&self) -> &Arc<LocalFileStore> {
        &self.shared.files
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn video_service(&self) -> &Arc<dyn VideoService> {
        &self.shared.video_service
    }

    #[must_use]
    pub fn share_service(&self) -> &Arc<dyn ShareService> {
        &self.shared.share_service
    }

    #[must_use]
    pub fn access(&self) -> &AccessGateway {
        &self.shared.access
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (server, max_upload_bytes) = {
        let config = state.config().read().await;
        (config.server.clone(), config.storage.max_upload_bytes)
    };

    let admin_routes = create_admin_router(state.clone(), max_upload_bytes);

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let api_router = Router::new()
        .merge(admin_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::get_current_user))
        .route("/videos", get(videos::list_public_videos))
        .route("/videos/{id}", get(videos::get_video))
        .route("/stream/{id}", get(stream::stream_video))
        .route("/share/{token}", get(shares::open_share))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_admin_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/admin/videos",
            get(videos::list_all_videos).post(videos::upload_video),
        )
        .route("/admin/videos/{id}", put(videos::update_video))
        .route("/admin/videos/{id}", delete(videos::delete_video))
        .route("/admin/videos/{id}/shares", get(shares::list_shares))
        .route("/admin/videos/{id}/shares", post(shares::create_share))
        .route("/admin/shares/{id}/toggle", put(shares::toggle_share))
        .route("/admin/shares/{id}", delete(shares::delete_share))
        .route("/admin/tasks/cleanup", post(tasks::trigger_cleanup))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::admin_middleware))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
