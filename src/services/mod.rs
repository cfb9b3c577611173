pub mod login_guard;
pub mod login_guard_impl;
pub use login_guard::{AccountError, LoginGuard};
pub use login_guard_impl::SeaOrmLoginGuard;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod reactivation_service;
pub mod reactivation_service_impl;
pub use reactivation_service::{ReactivationError, ReactivationService};
pub use reactivation_service_impl::SeaOrmReactivationService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{
    AccountService, BootstrapOutcome, CreateUserInput, UpdateUserInput, UserSummary,
};
pub use account_service_impl::SeaOrmAccountService;
