use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::Requester;
use crate::services::{AuthError, UserInfo};

/// Session key holding the logged in user's id.
const SESSION_USER_ID: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::UserNotFound => Self::Unauthorized("User not found".to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Conflict(msg) => Self::Conflict(format!("User already exists: {msg}")),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Lets only logged in admins through.
///
/// Anonymous callers get 401, logged in non-admins 403. The resolved
/// [`Requester`] is stored in the request extensions for the handlers.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let requester = current_requester(&state, &session).await?;

    let Some(user_id) = requester.user_id else {
        return Err(ApiError::Unauthorized("Not authenticated".to_string()));
    };
    tracing::Span::current().record("user_id", user_id);

    if !requester.is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    request.extensions_mut().insert(requester);
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    // Fresh id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let user_id = session_user_id(&session)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = state.auth_service().get_user(user_id).await?;
    Ok(Json(ApiResponse::success(user)))
}

// ============================================================================
// Helpers
// ============================================================================

async fn session_user_id(session: &Session) -> Result<Option<i32>, ApiError> {
    session
        .get::<i32>(SESSION_USER_ID)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}

/// Builds the caller identity from the session.
///
/// Admin status is read from the database on every call, and a session whose
/// user no longer exists is treated as anonymous.
pub async fn current_requester(
    state: &AppState,
    session: &Session,
) -> Result<Requester, ApiError> {
    let Some(user_id) = session_user_id(session).await? else {
        return Ok(Requester::anonymous());
    };

    match state.auth_service().get_user(user_id).await {
        Ok(user) => Ok(Requester::user(user.id, user.is_admin)),
        Err(AuthError::UserNotFound) => Ok(Requester::anonymous()),
        Err(e) => Err(e.into()),
    }
}
