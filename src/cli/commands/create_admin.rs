//! Bootstrap administrator command handler

use crate::config::Config;
use crate::services::BootstrapOutcome;
use crate::state::SharedState;

pub async fn cmd_create_admin(config: Config) -> anyhow::Result<()> {
    let bootstrap = config.bootstrap.clone();
    let state = SharedState::connect(config).await?;

    match state
        .account_service
        .ensure_bootstrap_admin(&bootstrap)
        .await?
    {
        BootstrapOutcome::Created(user) => {
            println!("Created administrator \"{}\" (ID {})", user.username, user.id);
        }
        BootstrapOutcome::AlreadyExists(username) => {
            println!("Administrator \"{username}\" already exists, nothing to do.");
        }
    }

    Ok(())
}
