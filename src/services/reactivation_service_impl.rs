//! `SeaORM` implementation of the `ReactivationService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{CreateOutcome, ProcessOutcome, ReactivationRequest, Store, User};
use crate::entities::reactivation_requests::RequestStatus;
use crate::services::reactivation_service::{
    MAX_TEXT_LEN, ReactivationError, ReactivationService,
};

pub struct SeaOrmReactivationService {
    store: Store,
}

impl SeaOrmReactivationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn process(
        &self,
        admin: &User,
        request_id: i32,
        response: Option<String>,
        decision: RequestStatus,
    ) -> Result<ReactivationRequest, ReactivationError> {
        require_admin(admin)?;
        let response = normalize_text(response, "Response")?;

        let outcome = match decision {
            RequestStatus::Approved => {
                self.store
                    .approve_reactivation_request(request_id, admin.id, response)
                    .await?
            }
            _ => {
                self.store
                    .reject_reactivation_request(request_id, admin.id, response)
                    .await?
            }
        };

        match outcome {
            ProcessOutcome::Processed(request) => {
                metrics::counter!("reactivation_requests_total", "action" => decision.as_str())
                    .increment(1);
                info!(
                    request_id = request.id,
                    user_id = request.user_id,
                    admin_id = admin.id,
                    status = decision.as_str(),
                    "Reactivation request processed"
                );
                Ok(request)
            }
            ProcessOutcome::NotFound => Err(ReactivationError::RequestNotFound(request_id)),
            ProcessOutcome::AlreadyProcessed(status) => {
                Err(ReactivationError::AlreadyProcessed(status))
            }
        }
    }
}

fn require_admin(user: &User) -> Result<(), ReactivationError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ReactivationError::Unauthorized)
    }
}

/// Trims free text; blank becomes `None`.
fn normalize_text(
    text: Option<String>,
    field: &str,
) -> Result<Option<String>, ReactivationError> {
    let Some(text) = text else {
        return Ok(None);
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(ReactivationError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }

    Ok(Some(trimmed.to_string()))
}

#[async_trait]
impl ReactivationService for SeaOrmReactivationService {
    async fn submit_request(
        &self,
        username: &str,
        message: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ReactivationError::Validation(
                "Username is required".to_string(),
            ));
        }
        let message = normalize_text(message, "Message")?;

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| ReactivationError::AccountNotFound(username.to_string()))?;

        if !user.disabled_by_login_limit {
            return Err(ReactivationError::NotEligible);
        }

        if self.store.has_pending_reactivation(user.id).await? {
            return Err(ReactivationError::DuplicatePending);
        }

        match self
            .store
            .create_reactivation_request(user.id, message)
            .await?
        {
            CreateOutcome::Created(request) => {
                metrics::counter!("reactivation_requests_total", "action" => "submitted")
                    .increment(1);
                info!(
                    request_id = request.id,
                    user_id = user.id,
                    "Reactivation request submitted"
                );
                Ok(request)
            }
            CreateOutcome::DuplicatePending => Err(ReactivationError::DuplicatePending),
        }
    }

    async fn list_requests(
        &self,
        admin: &User,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ReactivationRequest>, ReactivationError> {
        require_admin(admin)?;
        Ok(self.store.list_reactivation_requests(status).await?)
    }

    async fn approve(
        &self,
        admin: &User,
        request_id: i32,
        response: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError> {
        self.process(admin, request_id, response, RequestStatus::Approved)
            .await
    }

    async fn reject(
        &self,
        admin: &User,
        request_id: i32,
        response: Option<String>,
    ) -> Result<ReactivationRequest, ReactivationError> {
        self.process(admin, request_id, response, RequestStatus::Rejected)
            .await
    }
}
