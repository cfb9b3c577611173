use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::reactivation_requests::RequestStatus;

pub mod migrator;
pub mod repositories;

pub use repositories::reactivation::{CreateOutcome, ProcessOutcome, ReactivationRequest};
pub use repositories::user::{LoginAttempt, NewUser, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database sees its own empty
        // database, so those are pinned to a single connection.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn reactivation_repo(&self) -> repositories::reactivation::ReactivationRepository {
        repositories::reactivation::ReactivationRepository::new(self.conn.clone())
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(username, password).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        self.user_repo().email_taken(email, except_id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn list_students(&self) -> Result<Vec<User>> {
        self.user_repo().list_students().await
    }

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        changes: UserChanges,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, changes, config).await
    }

    pub async fn set_user_active(&self, id: i32, is_active: bool) -> Result<Option<User>> {
        self.user_repo().set_active(id, is_active).await
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn record_login_attempt(&self, id: i32) -> Result<Option<LoginAttempt>> {
        self.user_repo().record_login_attempt(id).await
    }

    pub async fn reset_login_state(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().reset_login_state(id).await
    }

    pub async fn get_reactivation_request(&self, id: i32) -> Result<Option<ReactivationRequest>> {
        self.reactivation_repo().get(id).await
    }

    pub async fn has_pending_reactivation(&self, user_id: i32) -> Result<bool> {
        self.reactivation_repo().has_pending(user_id).await
    }

    pub async fn create_reactivation_request(
        &self,
        user_id: i32,
        message: Option<String>,
    ) -> Result<CreateOutcome> {
        self.reactivation_repo().create(user_id, message).await
    }

    pub async fn list_reactivation_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ReactivationRequest>> {
        self.reactivation_repo().list(status).await
    }

    pub async fn approve_reactivation_request(
        &self,
        id: i32,
        admin_id: i32,
        response: Option<String>,
    ) -> Result<ProcessOutcome> {
        self.reactivation_repo().approve(id, admin_id, response).await
    }

    pub async fn reject_reactivation_request(
        &self,
        id: i32,
        admin_id: i32,
        response: Option<String>,
    ) -> Result<ProcessOutcome> {
        self.reactivation_repo().reject(id, admin_id, response).await
    }
}
