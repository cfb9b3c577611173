use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::db::User;
use crate::services::AuthError;

/// Session key holding the authenticated user's id.
const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The active account behind the current session, inserted by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware. Resolves the session to an active account and
/// exposes it to handlers as a [`CurrentUser`] extension. Sessions of
/// accounts that have since been disabled no longer authenticate.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = match state.shared.auth_service.session_user(user_id).await {
        Ok(user) => user,
        Err(AuthError::UserNotFound) => {
            let _ = session.flush().await;
            return Err(ApiError::Unauthorized("Not authenticated".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Rejects non-administrators. Must run inside [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|CurrentUser(user)| user.is_admin());

    if !is_admin {
        return Err(ApiError::forbidden());
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password and establish a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .shared
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    )
}

/// GET /auth/me
/// Get current user information (requires authentication)
pub async fn get_current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from(user)))
}
