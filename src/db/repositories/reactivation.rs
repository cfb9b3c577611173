use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use std::collections::HashMap;

use crate::entities::reactivation_requests::{self, RequestStatus};
use crate::entities::users;

use super::user::reset_login_state;

/// Reactivation request with the usernames of the requester and processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactivationRequest {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub admin_response: Option<String>,
    pub processed_by: Option<i32>,
    pub processed_by_username: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl ReactivationRequest {
    fn from_model(model: reactivation_requests::Model, names: &HashMap<i32, String>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            username: names.get(&model.user_id).cloned().unwrap_or_default(),
            requested_at: model.requested_at,
            status: model.status,
            message: model.message,
            admin_response: model.admin_response,
            processed_by: model.processed_by,
            processed_by_username: model.processed_by.and_then(|id| names.get(&id).cloned()),
            processed_at: model.processed_at,
        }
    }
}

#[derive(Debug)]
pub enum CreateOutcome {
    Created(ReactivationRequest),
    DuplicatePending,
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Processed(ReactivationRequest),
    NotFound,
    AlreadyProcessed(RequestStatus),
}

pub struct ReactivationRepository {
    conn: DatabaseConnection,
}

impl ReactivationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<ReactivationRequest>> {
        let Some(model) = reactivation_requests::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query reactivation request")?
        else {
            return Ok(None);
        };

        let names = self.usernames(&[model.clone()]).await?;
        Ok(Some(ReactivationRequest::from_model(model, &names)))
    }

    pub async fn has_pending(&self, user_id: i32) -> Result<bool> {
        let pending = reactivation_requests::Entity::find()
            .filter(reactivation_requests::Column::UserId.eq(user_id))
            .filter(reactivation_requests::Column::Status.eq(RequestStatus::Pending))
            .one(&self.conn)
            .await
            .context("Failed to query pending reactivation requests")?;

        Ok(pending.is_some())
    }

    /// Inserts a pending request. A concurrent insert that slipped past the
    /// caller's pending check hits the partial unique index and is reported
    /// as [`CreateOutcome::DuplicatePending`].
    pub async fn create(&self, user_id: i32, message: Option<String>) -> Result<CreateOutcome> {
        let inserted = reactivation_requests::ActiveModel {
            user_id: Set(user_id),
            requested_at: Set(Utc::now()),
            status: Set(RequestStatus::Pending),
            message: Set(message),
            admin_response: Set(None),
            processed_by: Set(None),
            processed_at: Set(None),
            ..Default::default()
        }
        .insert(&self.conn)
        .await;

        match inserted {
            Ok(model) => {
                let names = self.usernames(&[model.clone()]).await?;
                Ok(CreateOutcome::Created(ReactivationRequest::from_model(
                    model, &names,
                )))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(CreateOutcome::DuplicatePending)
            }
            Err(err) => Err(err).context("Failed to insert reactivation request"),
        }
    }

    /// Requests newest first, optionally restricted to one status.
    pub async fn list(&self, status: Option<RequestStatus>) -> Result<Vec<ReactivationRequest>> {
        let mut query = reactivation_requests::Entity::find()
            .order_by_desc(reactivation_requests::Column::RequestedAt)
            .order_by_desc(reactivation_requests::Column::Id);

        if let Some(status) = status {
            query = query.filter(reactivation_requests::Column::Status.eq(status));
        }

        let models = query
            .all(&self.conn)
            .await
            .context("Failed to list reactivation requests")?;

        let names = self.usernames(&models).await?;
        Ok(models
            .into_iter()
            .map(|m| ReactivationRequest::from_model(m, &names))
            .collect())
    }

    /// Approves a pending request and resets the owner's login state in the
    /// same transaction.
    pub async fn approve(
        &self,
        id: i32,
        admin_id: i32,
        response: Option<String>,
    ) -> Result<ProcessOutcome> {
        self.process(id, admin_id, response, RequestStatus::Approved)
            .await
    }

    /// Rejects a pending request. The owner's account is left as it is.
    pub async fn reject(
        &self,
        id: i32,
        admin_id: i32,
        response: Option<String>,
    ) -> Result<ProcessOutcome> {
        self.process(id, admin_id, response, RequestStatus::Rejected)
            .await
    }

    async fn process(
        &self,
        id: i32,
        admin_id: i32,
        response: Option<String>,
        status: RequestStatus,
    ) -> Result<ProcessOutcome> {
        let txn = self.conn.begin().await?;

        let updated = reactivation_requests::Entity::update_many()
            .col_expr(reactivation_requests::Column::Status, Expr::value(status))
            .col_expr(
                reactivation_requests::Column::AdminResponse,
                Expr::value(response),
            )
            .col_expr(
                reactivation_requests::Column::ProcessedBy,
                Expr::value(Some(admin_id)),
            )
            .col_expr(
                reactivation_requests::Column::ProcessedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(reactivation_requests::Column::Id.eq(id))
            .filter(reactivation_requests::Column::Status.eq(RequestStatus::Pending))
            .exec(&txn)
            .await
            .context("Failed to update reactivation request")?;

        let model = reactivation_requests::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to reload reactivation request")?;

        let Some(model) = model else {
            txn.rollback().await?;
            return Ok(ProcessOutcome::NotFound);
        };

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(ProcessOutcome::AlreadyProcessed(model.status));
        }

        if status == RequestStatus::Approved {
            reset_login_state(&txn, model.user_id).await?;
        }

        txn.commit().await?;

        let names = self.usernames(&[model.clone()]).await?;
        Ok(ProcessOutcome::Processed(ReactivationRequest::from_model(
            model, &names,
        )))
    }

    async fn usernames(
        &self,
        models: &[reactivation_requests::Model],
    ) -> Result<HashMap<i32, String>> {
        let mut ids: Vec<i32> = models
            .iter()
            .flat_map(|m| std::iter::once(m.user_id).chain(m.processed_by))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&self.conn)
            .await
            .context("Failed to load request usernames")?;

        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }
}
