use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CleanupResponse, FailedFile};

/// POST /admin/tasks/cleanup
///
/// Runs one orphan cleanup pass and reports what it removed.
pub async fn trigger_cleanup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CleanupResponse>>, ApiError> {
    let report = state.video_service().cleanup_orphans().await?;

    Ok(Json(ApiResponse::success(CleanupResponse {
        removed: report.removed,
        failed: report
            .failed
            .into_iter()
            .map(|(name, error)| FailedFile { name, error })
            .collect(),
    })))
}
