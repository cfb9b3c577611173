//! Domain service for the account reactivation workflow.
//!
//! A holder whose account was disabled by the login limit files a request;
//! an administrator approves it (which resets the account) or rejects it.
//! Requests move `pending -> approved` or `pending -> rejected` and never
//! leave a terminal state.

use thiserror::Error;

use crate::db::{ReactivationRequest, User};
use crate::entities::reactivation_requests::RequestStatus;

/// Longest accepted requester message or administrator response.
pub const MAX_TEXT_LEN: usize = 2000;

/// Errors specific to reactivation operations.
#[derive(Debug, Error)]
pub enum ReactivationError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account is not disabled by the login limit")]
    NotEligible,

    #[error("A pending reactivation request already exists for this account")]
    DuplicatePending,

    #[error("Reactivation request not found: {0}")]
    RequestNotFound(i32),

    #[error("Reactivation request was already {}", .0.as_str())]
    AlreadyProcessed(RequestStatus),

    #[error("Permission denied")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ReactivationError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ReactivationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for reactivation requests.
#[async_trait::async_trait]
pub trait ReactivationService: Send + Sync {
    /// Files a pending request for `username`. Needs no session.
    ///
    /// # Errors
    ///
    /// [`ReactivationError::AccountNotFound`] for an unknown username,
    /// [`ReactivationError::NotEligible`] when the account is not
    /// limit-disabled, [`ReactivationError::DuplicatePending`] when a pending
    /// request already exists.
    async fn submit_request(
        &self,
        username: &str,
        message: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError>;

    /// Lists requests newest first, optionally filtered by status.
    async fn list_requests(
        &self,
        admin: &User,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ReactivationRequest>, ReactivationError>;

    /// Approves a pending request and re-enables its account atomically.
    async fn approve(
        &self,
        admin: &User,
        request_id: i32,
        response: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError>;

    /// Rejects a pending request. The account stays disabled.
    async fn reject(
        &self,
        admin: &User,
        request_id: i32,
        response: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError>;
}
