//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::db::{NewUser, Store, User, UserChanges};
use crate::entities::users::UserType;
use crate::services::account_service::{
    AccountError, AccountService, BootstrapOutcome, CreateUserInput, UpdateUserInput,
    UserSummary,
};
use crate::services::login_guard::LoginGuard;

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmAccountService {
    store: Store,
    guard: Arc<dyn LoginGuard>,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(store: Store, guard: Arc<dyn LoginGuard>, security: SecurityConfig) -> Self {
        Self {
            store,
            guard,
            security,
        }
    }

    async fn load(&self, user_id: i32) -> Result<User, AccountError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AccountError::NotFound(user_id))
    }

    /// Normalizes an optional email and checks it is free.
    async fn checked_email(
        &self,
        email: Option<String>,
        except_id: Option<i32>,
    ) -> Result<Option<String>, AccountError> {
        let Some(email) = email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) else {
            return Ok(None);
        };

        if !email.contains('@') {
            return Err(AccountError::Validation(format!(
                "Invalid email address: {email}"
            )));
        }

        if self.store.email_taken(&email, except_id).await? {
            return Err(AccountError::Conflict(format!(
                "Email \"{email}\" is already registered"
            )));
        }

        Ok(Some(email))
    }
}

fn require_admin(user: &User) -> Result<(), AccountError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AccountError::Unauthorized)
    }
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_max_logins(max: i32) -> Result<(), AccountError> {
    if max < 1 {
        return Err(AccountError::Validation(
            "max_logins_allowed must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn list_users(&self, admin: &User) -> Result<Vec<UserSummary>, AccountError> {
        require_admin(admin)?;

        let now = Utc::now();
        let window = Duration::minutes(self.security.online_window_minutes);

        Ok(self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|user| UserSummary::new(user, now, window))
            .collect())
    }

    async fn list_students(&self, admin: &User) -> Result<Vec<User>, AccountError> {
        require_admin(admin)?;
        Ok(self.store.list_students().await?)
    }

    async fn create_user(
        &self,
        admin: &User,
        input: CreateUserInput,
    ) -> Result<User, AccountError> {
        require_admin(admin)?;

        let username = input.username.trim().to_string();
        if username.is_empty() || input.password.is_empty() {
            return Err(AccountError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if input.password != input.password_confirm {
            return Err(AccountError::Validation(
                "Passwords do not match".to_string(),
            ));
        }
        validate_password(&input.password)?;

        let max_logins_allowed = input
            .max_logins_allowed
            .unwrap_or(self.security.default_max_logins_allowed);
        validate_max_logins(max_logins_allowed)?;

        if self.store.username_exists(&username).await? {
            return Err(AccountError::Conflict(format!(
                "Username \"{username}\" already exists"
            )));
        }
        let email = self.checked_email(input.email, None).await?;

        let user = self
            .store
            .create_user(
                NewUser {
                    username,
                    password: input.password,
                    email,
                    first_name: input.first_name.trim().to_string(),
                    last_name: input.last_name.trim().to_string(),
                    user_type: input.user_type,
                    max_logins_allowed,
                },
                &self.security,
            )
            .await?;

        info!(
            user_id = user.id,
            username = %user.username,
            user_type = user.user_type.as_str(),
            created_by = admin.id,
            "User created"
        );

        Ok(user)
    }

    async fn update_user(
        &self,
        admin: &User,
        user_id: i32,
        input: UpdateUserInput,
    ) -> Result<User, AccountError> {
        require_admin(admin)?;
        self.load(user_id).await?;

        if let Some(max) = input.max_logins_allowed {
            validate_max_logins(max)?;
        }
        if let Some(password) = &input.password {
            validate_password(password)?;
        }
        if user_id == admin.id && input.user_type == Some(UserType::Student) {
            return Err(AccountError::Validation(
                "You cannot remove your own administrator role".to_string(),
            ));
        }

        let email = match input.email {
            Some(email) => Some(self.checked_email(Some(email), Some(user_id)).await?),
            None => None,
        };

        let changes = UserChanges {
            email,
            first_name: input.first_name.map(|s| s.trim().to_string()),
            last_name: input.last_name.map(|s| s.trim().to_string()),
            user_type: input.user_type,
            max_logins_allowed: input.max_logins_allowed,
            password: input.password,
        };

        let user = self
            .store
            .update_user(user_id, changes, &self.security)
            .await?
            .ok_or(AccountError::NotFound(user_id))?;

        info!(user_id = user.id, updated_by = admin.id, "User updated");
        Ok(user)
    }

    async fn toggle_status(&self, admin: &User, user_id: i32) -> Result<User, AccountError> {
        require_admin(admin)?;
        if user_id == admin.id {
            return Err(AccountError::Validation(
                "You cannot change the status of your own account".to_string(),
            ));
        }

        let target = self.load(user_id).await?;

        let user = if target.is_active {
            self.store
                .set_user_active(user_id, false)
                .await?
                .ok_or(AccountError::NotFound(user_id))?
        } else if target.disabled_by_login_limit {
            self.guard.reset_login_count(user_id).await?
        } else {
            self.store
                .set_user_active(user_id, true)
                .await?
                .ok_or(AccountError::NotFound(user_id))?
        };

        info!(
            user_id = user.id,
            is_active = user.is_active,
            changed_by = admin.id,
            "User status toggled"
        );
        Ok(user)
    }

    async fn reset_login_count(&self, admin: &User, user_id: i32) -> Result<User, AccountError> {
        require_admin(admin)?;
        let user = self.guard.reset_login_count(user_id).await?;

        info!(user_id = user.id, reset_by = admin.id, "Login count reset");
        Ok(user)
    }

    async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> Result<BootstrapOutcome, AccountError> {
        let username = bootstrap.admin_username.trim();
        if username.is_empty() || bootstrap.admin_password.is_empty() {
            return Err(AccountError::Validation(
                "Bootstrap admin username and password are required".to_string(),
            ));
        }

        if self.store.username_exists(username).await? {
            return Ok(BootstrapOutcome::AlreadyExists(username.to_string()));
        }

        let email = Some(bootstrap.admin_email.trim().to_string()).filter(|e| !e.is_empty());

        let user = self
            .store
            .create_user(
                NewUser {
                    username: username.to_string(),
                    password: bootstrap.admin_password.clone(),
                    email,
                    first_name: String::new(),
                    last_name: String::new(),
                    user_type: UserType::Admin,
                    max_logins_allowed: self.security.default_max_logins_allowed,
                },
                &self.security,
            )
            .await?;

        info!(username = %user.username, "Bootstrap administrator created");
        Ok(BootstrapOutcome::Created(user))
    }
}
