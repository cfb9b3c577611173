use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, BootstrapOutcome, LoginGuard, ReactivationService,
    SeaOrmAccountService, SeaOrmAuthService, SeaOrmLoginGuard, SeaOrmReactivationService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub login_guard: Arc<dyn LoginGuard>,

    pub auth_service: Arc<dyn AuthService>,

    pub reactivation_service: Arc<dyn ReactivationService>,

    pub account_service: Arc<dyn AccountService>,
}

impl SharedState {
    /// Connects, migrates and bootstraps the administrator account.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let bootstrap = config.bootstrap.clone();
        let state = Self::connect(config).await?;

        match state
            .account_service
            .ensure_bootstrap_admin(&bootstrap)
            .await?
        {
            BootstrapOutcome::Created(user) => {
                info!("Created bootstrap administrator \"{}\"", user.username);
            }
            BootstrapOutcome::AlreadyExists(username) => {
                info!("Bootstrap administrator \"{username}\" already exists");
            }
        }

        Ok(state)
    }

    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services over an already migrated store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let login_guard: Arc<dyn LoginGuard> = Arc::new(SeaOrmLoginGuard::new(store.clone()));

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            login_guard.clone(),
        ));

        let reactivation_service: Arc<dyn ReactivationService> =
            Arc::new(SeaOrmReactivationService::new(store.clone()));

        let account_service: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            login_guard.clone(),
            config.security.clone(),
        ));

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            login_guard,
            auth_service,
            reactivation_service,
            account_service,
        }
    }
}
