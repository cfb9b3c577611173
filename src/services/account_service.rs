//! Domain service for account administration.
//!
//! Covers the administrator views over accounts (listing, creation, edits,
//! status toggling, login-count resets) and bootstrapping the first
//! administrator.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::config::BootstrapConfig;
use crate::db::User;
use crate::entities::users::UserType;

pub use super::login_guard::AccountError;

/// Account listing entry with derived presence.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub user: User,
    pub is_online: bool,
}

impl UserSummary {
    #[must_use]
    pub fn new(user: User, now: DateTime<Utc>, online_window: Duration) -> Self {
        let is_online = user
            .last_login
            .is_some_and(|last| now.signed_duration_since(last) < online_window);
        Self { user, is_online }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub max_logins_allowed: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub max_logins_allowed: Option<i32>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    Created(User),
    AlreadyExists(String),
}

/// Domain service trait for account administration. Every method taking
/// `admin` fails with [`AccountError::Unauthorized`] for non-administrators.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// All accounts, newest first.
    async fn list_users(&self, admin: &User) -> Result<Vec<UserSummary>, AccountError>;

    /// Student accounts ordered by username.
    async fn list_students(&self, admin: &User) -> Result<Vec<User>, AccountError>;

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] for missing fields or mismatched
    /// passwords and [`AccountError::Conflict`] for a taken username or email.
    async fn create_user(
        &self,
        admin: &User,
        input: CreateUserInput,
    ) -> Result<User, AccountError>;

    async fn update_user(
        &self,
        admin: &User,
        user_id: i32,
        input: UpdateUserInput,
    ) -> Result<User, AccountError>;

    /// Flips the active flag. Enabling a limit-disabled account goes through
    /// the login-count reset so both flags stay consistent.
    async fn toggle_status(&self, admin: &User, user_id: i32) -> Result<User, AccountError>;

    async fn reset_login_count(&self, admin: &User, user_id: i32) -> Result<User, AccountError>;

    /// Creates the configured administrator unless the username exists.
    async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> Result<BootstrapOutcome, AccountError>;
}
