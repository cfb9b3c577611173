//! `SeaORM` implementation of the `LoginGuard` trait.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::db::{Store, User};
use crate::services::login_guard::{AccountError, LoginGuard};

pub struct SeaOrmLoginGuard {
    store: Store,
}

impl SeaOrmLoginGuard {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LoginGuard for SeaOrmLoginGuard {
    async fn record_login_attempt(&self, account: &User) -> Result<bool, AccountError> {
        if !account.user_type.is_attempt_limited() {
            return Ok(true);
        }

        let attempt = self
            .store
            .record_login_attempt(account.id)
            .await?
            .ok_or(AccountError::NotFound(account.id))?;

        if attempt.tripped {
            metrics::counter!("accounts_locked_total").increment(1);
            warn!(
                user_id = attempt.user.id,
                username = %attempt.user.username,
                login_count = attempt.user.login_count,
                max_logins_allowed = attempt.user.max_logins_allowed,
                "Account disabled by login limit"
            );
        } else {
            debug!(
                user_id = attempt.user.id,
                login_count = attempt.user.login_count,
                counted = attempt.counted,
                "Login attempt recorded"
            );
        }

        Ok(attempt.user.is_active)
    }

    async fn reset_login_count(&self, account_id: i32) -> Result<User, AccountError> {
        self.store
            .reset_login_state(account_id)
            .await?
            .ok_or(AccountError::NotFound(account_id))
    }
}
