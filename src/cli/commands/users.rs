//! List accounts command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No accounts yet.");
        println!();
        println!("Create the administrator with: examhall create-admin");
        return Ok(());
    }

    println!("Accounts ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let status = if user.disabled_by_login_limit {
            "locked"
        } else if user.is_active {
            "active"
        } else {
            "inactive"
        };

        println!(
            "{:>4}  {:<20} {:<8} {:<9} logins {}/{}",
            user.id,
            user.username,
            user.user_type.as_str(),
            status,
            user.login_count,
            user.max_logins_allowed
        );
    }

    Ok(())
}
