use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users::{self, UserType};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
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
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.user_type, UserType::Admin)
    }

    #[must_use]
    pub const fn is_student(&self) -> bool {
        matches!(self.user_type, UserType::Student)
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            user_type: model.user_type,
            is_active: model.is_active,
            login_count: model.login_count,
            max_logins_allowed: model.max_logins_allowed,
            disabled_by_login_limit: model.disabled_by_login_limit,
            last_login_attempt: model.last_login_attempt,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields for a new account. The password is plain text and hashed on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub max_logins_allowed: i32,
}

/// Partial update of an account; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<Option<String>>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: Option<UserType>,
    pub max_logins_allowed: Option<i32>,
    pub password: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Returns true when another account (not `except_id`) already uses the email.
    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(users::Column::Id.ne(id));
        }

        let user = query
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.is_some())
    }

    /// All accounts, newest first.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        let users = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(users.into_iter().map(User::from).collect())
    }

    /// Student accounts ordered by username.
    pub async fn list_students(&self) -> Result<Vec<User>> {
        let users = users::Entity::find()
            .filter(users::Column::UserType.eq(UserType::Student))
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await
            .context("Failed to list students")?;

        Ok(users.into_iter().map(User::from).collect())
    }

    /// Verify a username/password pair and return the account when it matches.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let password = new_user.password;
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = Utc::now();

        let model = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            password_hash: Set(password_hash),
            user_type: Set(new_user.user_type),
            is_active: Set(true),
            login_count: Set(0),
            max_logins_allowed: Set(new_user.max_logins_allowed),
            disabled_by_login_limit: Set(false),
            last_login_attempt: Set(None),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn update(
        &self,
        id: i32,
        changes: UserChanges,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let new_hash = match changes.password {
            Some(password) => {
                let config = config.clone();
                Some(
                    task::spawn_blocking(move || hash_password(&password, Some(&config)))
                        .await
                        .context("Password hashing task panicked")??,
                )
            }
            None => None,
        };

        let mut active = user.into_active_model();
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(user_type) = changes.user_type {
            active.user_type = Set(user_type);
        }
        if let Some(max) = changes.max_logins_allowed {
            active.max_logins_allowed = Set(max);
        }
        if let Some(hash) = new_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user")?;

        Ok(Some(User::from(model)))
    }

    /// Sets the general active flag without touching login-limit state.
    pub async fn set_active(&self, id: i32, is_active: bool) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for status change")?
        else {
            return Ok(None);
        };

        let mut active = user.into_active_model();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user status")?;

        Ok(Some(User::from(model)))
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record last login")?;

        Ok(())
    }

    /// Counts one admitted login for an attempt-limited account and disables it
    /// once the count exceeds its allowance.
    ///
    /// Both updates run in one transaction. The increment is a single
    /// `login_count = login_count + 1` statement, so concurrent attempts
    /// serialize on the write lock and each sees the previous increment.
    /// Accounts that are administrators or already limit-disabled are not
    /// counted; `counted` is false for them.
    pub async fn record_login_attempt(&self, id: i32) -> Result<Option<LoginAttempt>> {
        let now = Utc::now();
        let txn = self.conn.begin().await?;

        let counted = users::Entity::update_many()
            .col_expr(
                users::Column::LoginCount,
                Expr::col(users::Column::LoginCount).add(1),
            )
            .col_expr(users::Column::LastLoginAttempt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::UserType.eq(UserType::Student))
            .filter(users::Column::DisabledByLoginLimit.eq(false))
            .exec(&txn)
            .await
            .context("Failed to increment login count")?
            .rows_affected
            > 0;

        let tripped = if counted {
            users::Entity::update_many()
                .col_expr(users::Column::IsActive, Expr::value(false))
                .col_expr(users::Column::DisabledByLoginLimit, Expr::value(true))
                .filter(users::Column::Id.eq(id))
                .filter(
                    Expr::col(users::Column::LoginCount)
                        .gt(Expr::col(users::Column::MaxLoginsAllowed)),
                )
                .exec(&txn)
                .await
                .context("Failed to apply login limit")?
                .rows_affected
                > 0
        } else {
            false
        };

        let user = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to reload user after login attempt")?;

        txn.commit().await?;

        Ok(user.map(|user| LoginAttempt {
            user: User::from(user),
            counted,
            tripped,
        }))
    }

    /// Clears login-limit state and re-enables the account.
    pub async fn reset_login_state(&self, id: i32) -> Result<Option<User>> {
        let txn = self.conn.begin().await?;
        let found = reset_login_state(&txn, id).await?;
        let user = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to reload user after reset")?;
        txn.commit().await?;

        Ok(if found { user.map(User::from) } else { None })
    }
}

/// Result of [`UserRepository::record_login_attempt`].
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub user: User,
    /// The attempt incremented the counter.
    pub counted: bool,
    /// This attempt disabled the account.
    pub tripped: bool,
}

/// Resets login-limit state on any connection, so it can join a caller's
/// transaction. Returns false when the account does not exist.
pub async fn reset_login_state<C>(conn: &C, id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = users::Entity::update_many()
        .col_expr(users::Column::LoginCount, Expr::value(0))
        .col_expr(users::Column::IsActive, Expr::value(true))
        .col_expr(users::Column::DisabledByLoginLimit, Expr::value(false))
        .col_expr(
            users::Column::LastLoginAttempt,
            Expr::value(Option::<DateTime<Utc>>::None),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(id))
        .exec(conn)
        .await
        .context("Failed to reset login count")?;

    Ok(result.rows_affected > 0)
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses default (high memory) params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_with_default_verifier() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("s3cret-pass", Some(&config)).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"s3cret-pass", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong", &parsed)
                .is_err()
        );
    }
}
