mod create_admin;
mod reset_login;
mod users;

pub use create_admin::cmd_create_admin;
pub use reset_login::cmd_reset_login;
pub use users::cmd_list_users;
