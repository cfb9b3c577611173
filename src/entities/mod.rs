pub mod prelude;

pub mod reactivation_requests;
pub mod users;
