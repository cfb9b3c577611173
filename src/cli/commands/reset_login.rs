//! Login counter reset command handler

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_reset_login(config: Config, username: &str) -> anyhow::Result<()> {
    let state = SharedState::connect(config).await?;

    let Some(user) = state.store.get_user_by_username(username).await? else {
        println!("No account named \"{username}\".");
        return Ok(());
    };

    if !user.user_type.is_attempt_limited() {
        println!("\"{username}\" is not subject to the login limit.");
        return Ok(());
    }

    let user = state.login_guard.reset_login_count(user.id).await?;

    println!(
        "Reset \"{}\": {}/{} logins, account {}",
        user.username,
        user.login_count,
        user.max_logins_allowed,
        if user.is_active { "active" } else { "inactive" }
    );

    Ok(())
}
