//! `SeaORM` implementation of the `AuthService` trait.

use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::login_guard::LoginGuard;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    guard: Arc<dyn LoginGuard>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, guard: Arc<dyn LoginGuard>) -> Self {
        Self { store, guard }
    }
}

fn count_outcome(outcome: &'static str) {
    metrics::counter!("login_attempts_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let Some(user) = self.store.verify_credentials(username, password).await? else {
            count_outcome("invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        // Already locked accounts are refused without counting another attempt.
        if user.disabled_by_login_limit {
            count_outcome("locked");
            return Err(AuthError::AccountLocked);
        }

        if !user.is_active {
            count_outcome("inactive");
            return Err(AuthError::AccountInactive);
        }

        if user.user_type.is_attempt_limited() {
            let still_active = self.guard.record_login_attempt(&user).await?;
            if !still_active {
                count_outcome("locked");
                return Err(AuthError::AccountLocked);
            }
        }

        self.store.touch_last_login(user.id).await?;
        let user = self
            .store
            .get_user(user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        count_outcome("success");
        info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(user)
    }

    async fn session_user(&self, user_id: i32) -> Result<User, AuthError> {
        match self.store.get_user(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::UserNotFound),
        }
    }
}
