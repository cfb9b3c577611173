//! Account administration endpoints and the per-role dashboard.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, DashboardDto, UserDto, UserListItemDto};
use crate::entities::reactivation_requests::RequestStatus;
use crate::services::{CreateUserInput, UpdateUserInput};

/// GET /dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let pending_reactivation_requests = if user.is_admin() {
        let pending = state
            .shared
            .reactivation_service
            .list_requests(&user, Some(RequestStatus::Pending))
            .await?;
        Some(pending.len())
    } else {
        None
    };

    Ok(Json(ApiResponse::success(DashboardDto {
        role: user.user_type,
        user: user.into(),
        pending_reactivation_requests,
    })))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UserListItemDto>>>, ApiError> {
    let users = state.shared.account_service.list_users(&admin).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserListItemDto::from).collect(),
    )))
}

/// GET /students
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let students = state.shared.account_service.list_students(&admin).await?;
    Ok(Json(ApiResponse::success(
        students.into_iter().map(UserDto::from).collect(),
    )))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(payload): Json<CreateUserInput>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .shared
        .account_service
        .create_user(&admin, payload)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .shared
        .account_service
        .update_user(&admin, id, payload)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /users/{id}/toggle-status
pub async fn toggle_status(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .shared
        .account_service
        .toggle_status(&admin, id)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /users/{id}/reset-login-count
pub async fn reset_login_count(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .shared
        .account_service
        .reset_login_count(&admin, id)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}
