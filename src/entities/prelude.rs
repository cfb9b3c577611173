pub use super::reactivation_requests::Entity as ReactivationRequests;
pub use super::users::Entity as Users;
