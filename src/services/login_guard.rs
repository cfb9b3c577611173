//! Domain service for login-attempt limiting.
//!
//! Student accounts are admitted a fixed number of times
//! (`max_logins_allowed`); the attempt that goes past the allowance disables
//! the account until an administrator resets it or approves a reactivation
//! request. Administrators are never counted.

use thiserror::Error;

use crate::db::User;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("User not found: {0}")]
    NotFound(i32),

    #[error("Permission denied")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for the login-attempt guard.
#[async_trait::async_trait]
pub trait LoginGuard: Send + Sync {
    /// Counts an admitted login for `account`, whose credentials the caller
    /// has already verified. Returns whether the account is still active
    /// afterwards; `false` means this very attempt must be refused.
    ///
    /// Exempt (administrator) accounts return `true` without any write.
    async fn record_login_attempt(&self, account: &User) -> Result<bool, AccountError>;

    /// Zeroes the counter, clears the limit flag and re-enables the account.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] for an unknown account id.
    async fn reset_login_count(&self, account_id: i32) -> Result<User, AccountError>;
}
