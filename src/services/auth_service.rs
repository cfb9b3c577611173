//! Domain service for authentication.
//!
//! Handles credential login (including the login-attempt gate) and lookup of
//! the account behind a session.

use thiserror::Error;

use crate::db::User;

use super::login_guard::AccountError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled after exceeding the allowed number of logins")]
    AccountLocked,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccountError> for AuthError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => Self::UserNotFound,
            AccountError::Database(msg) => Self::Database(msg),
            AccountError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and admits the account.
    ///
    /// Order of checks: credentials, login-limit flag, active flag, then the
    /// attempt is counted for attempt-limited accounts. Only a still-active
    /// account is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for a wrong username or
    /// password, [`AuthError::AccountLocked`] when the account is (or this
    /// attempt made it) limit-disabled, and [`AuthError::AccountInactive`]
    /// when an administrator disabled it.
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Loads the account behind a session. Inactive accounts are treated as
    /// not found so their sessions stop authenticating.
    async fn session_user(&self, user_id: i32) -> Result<User, AuthError>;
}
