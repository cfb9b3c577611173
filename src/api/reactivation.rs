//! Reactivation request endpoints.
//!
//! Submission is public: the holder of a disabled account cannot log in.
//! Listing and processing are administrator-only.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, ReactivationRequestDto};
use crate::entities::reactivation_requests::RequestStatus;

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub username: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<RequestStatus>,
}

#[derive(Deserialize, Default)]
pub struct ProcessRequest {
    #[serde(default)]
    pub response: Option<String>,
}

/// POST /request-reactivation
pub async fn submit_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<ApiResponse<ReactivationRequestDto>>, ApiError> {
    let request = state
        .shared
        .reactivation_service
        .submit_request(&payload.username, payload.message)
        .await?;
    Ok(Json(ApiResponse::success(request.into())))
}

/// GET /reactivation-requests?status=pending
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ReactivationRequestDto>>>, ApiError> {
    let requests = state
        .shared
        .reactivation_service
        .list_requests(&admin, query.status)
        .await?;
    Ok(Json(ApiResponse::success(
        requests.into_iter().map(ReactivationRequestDto::from).collect(),
    )))
}

/// POST /reactivation-requests/{id}/approve
pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Option<Json<ProcessRequest>>,
) -> Result<Json<ApiResponse<ReactivationRequestDto>>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let request = state
        .shared
        .reactivation_service
        .approve(&admin, id, payload.response)
        .await?;
    Ok(Json(ApiResponse::success(request.into())))
}

/// POST /reactivation-requests/{id}/reject
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    payload: Option<Json<ProcessRequest>>,
) -> Result<Json<ApiResponse<ReactivationRequestDto>>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let request = state
        .shared
        .reactivation_service
        .reject(&admin, id, payload.response)
        .await?;
    Ok(Json(ApiResponse::success(request.into())))
}
