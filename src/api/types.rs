use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{ReactivationRequest, User};
use crate::entities::reactivation_requests::RequestStatus;
use crate::entities::users::UserType;
use crate::services::UserSummary;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub login_count: i32,
    pub max_logins_allowed: i32,
    pub disabled_by_login_limit: bool,
    pub last_login_attempt: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            user_type: user.user_type,
            is_active: user.is_active,
            login_count: user.login_count,
            max_logins_allowed: user.max_logins_allowed,
            disabled_by_login_limit: user.disabled_by_login_limit,
            last_login_attempt: user.last_login_attempt,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListItemDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub is_online: bool,
}

impl From<UserSummary> for UserListItemDto {
    fn from(summary: UserSummary) -> Self {
        Self {
            user: summary.user.into(),
            is_online: summary.is_online,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReactivationRequestDto {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub admin_response: Option<String>,
    pub processed_by: Option<i32>,
    pub processed_by_username: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<ReactivationRequest> for ReactivationRequestDto {
    fn from(request: ReactivationRequest) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            username: request.username,
            requested_at: request.requested_at,
            status: request.status,
            message: request.message,
            admin_response: request.admin_response,
            processed_by: request.processed_by,
            processed_by_username: request.processed_by_username,
            processed_at: request.processed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub user: UserDto,
    pub role: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_reactivation_requests: Option<usize>,
}
