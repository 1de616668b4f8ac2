use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tower_http::services::ServeFile;
use tower_sessions::Session;

use super::auth::current_requester;
use super::validation::validate_video_id;
use super::videos::TokenQuery;
use super::{ApiError, AppState};
use crate::services::{AccessDecision, AccessRoute};
use crate::storage::FileStore;

const PUBLIC_CACHE: &str = "public, max-age=31536000";
const PRIVATE_CACHE: &str = "private, no-store";

/// GET /stream/{id}?token=
///
/// Serves the file with HTTP range support. Never counts a view; players
/// issue many range requests per playback.
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_video_id(id)?;
    let requester = current_requester(&state, &session).await?;
    let video = state.video_service().get(id).await?;

    let route = match state
        .access()
        .authorize_stream(&video, &requester, query.token.as_deref())
        .await?
    {
        AccessDecision::Allow(route) => route,
        AccessDecision::Deny(reason) => return Err(reason.into()),
    };

    let path = state
        .files()
        .path_of(&video.filename)
        .map_err(|e| ApiError::StorageError(e.to_string()))?;

    let mut req = axum::http::Request::builder();
    for name in [header::RANGE, header::IF_RANGE, header::IF_MODIFIED_SINCE] {
        if let Some(value) = headers.get(&name) {
            req = req.header(name, value.clone());
        }
    }
    let req = req
        .body(axum::body::Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build request: {e}")))?;

    let mut response = ServeFile::new(path)
        .try_call(req)
        .await
        .map_err(|e| ApiError::internal(format!("Streaming error: {e}")))?;

    let cache_control = if route == AccessRoute::Public {
        PUBLIC_CACHE
    } else {
        PRIVATE_CACHE
    };
    let response_headers = response.headers_mut();
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    Ok(response)
}
