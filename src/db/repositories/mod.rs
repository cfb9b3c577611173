pub mod reactivation;
pub mod user;
