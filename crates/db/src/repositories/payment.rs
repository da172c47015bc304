//! Partner payment repository.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use affdesk_core::workflow::{PaymentWorkflow, WorkflowError};
use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{
    brands, flows, partner_payments, payment_methods, sea_orm_active_enums::PaymentStatus,
};

/// Error types for partner payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(Uuid),

    /// A referenced record does not exist.
    #[error("{field} does not exist: {id}")]
    UnknownReference {
        /// Input field name.
        field: &'static str,
        /// Referenced id.
        id: Uuid,
    },

    /// Amount must be positive.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Period end before start.
    #[error("period_to must not be before period_from")]
    InvalidPeriod,

    /// Status transition or edit refused.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound(_) => Self::NotFound(err.to_string()),
            PaymentError::UnknownReference { field, .. } => Self::field(field, err.to_string()),
            PaymentError::NonPositiveAmount => Self::field("amount", err.to_string()),
            PaymentError::InvalidPeriod => Self::field("period_to", err.to_string()),
            PaymentError::Workflow(e) => e.into(),
            PaymentError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    /// Paying brand.
    pub brand_id: Uuid,
    /// Flow the payment settles.
    pub flow_id: Option<Uuid>,
    /// Payment method.
    pub payment_method_id: Option<Uuid>,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// External reference.
    pub reference: Option<String>,
    /// Settled period start.
    pub period_from: Option<NaiveDate>,
    /// Settled period end.
    pub period_to: Option<NaiveDate>,
    /// Comment.
    pub comment: Option<String>,
    /// Author.
    pub created_by: Uuid,
}

/// Input for updating a pending or held payment.
#[derive(Debug, Clone, Default)]
pub struct UpdatePaymentInput {
    /// Paying brand.
    pub brand_id: Option<Uuid>,
    /// Flow.
    pub flow_id: Option<Option<Uuid>>,
    /// Payment method.
    pub payment_method_id: Option<Option<Uuid>>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Currency code.
    pub currency: Option<String>,
    /// External reference.
    pub reference: Option<Option<String>>,
    /// Period start.
    pub period_from: Option<Option<NaiveDate>>,
    /// Period end.
    pub period_to: Option<Option<NaiveDate>>,
    /// Comment.
    pub comment: Option<Option<String>>,
}

/// Filter options for listing payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Filter by status.
    pub status: Option<PaymentStatus>,
    /// Filter by brand.
    pub brand_id: Option<Uuid>,
    /// Filter by flow.
    pub flow_id: Option<Uuid>,
    /// Created on or after.
    pub from: Option<NaiveDate>,
    /// Created on or before.
    pub to: Option<NaiveDate>,
}

fn check_period(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), PaymentError> {
    match (from, to) {
        (Some(from), Some(to)) if to < from => Err(PaymentError::InvalidPeriod),
        _ => Ok(()),
    }
}

/// Partner payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists payments, newest first.
    pub async fn list(
        &self,
        filter: PaymentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<partner_payments::Model>, PaymentError> {
        let mut query = partner_payments::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(partner_payments::Column::Status.eq(status));
        }
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(partner_payments::Column::BrandId.eq(brand_id));
        }
        if let Some(flow_id) = filter.flow_id {
            query = query.filter(partner_payments::Column::FlowId.eq(flow_id));
        }
        if let Some(from) = filter.from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query = query.filter(partner_payments::Column::CreatedAt.gte(from.and_utc()));
        }
        if let Some(to) = filter
            .to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            query = query.filter(partner_payments::Column::CreatedAt.lt(to.and_utc()));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(partner_payments::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Loads a payment or fails with `PaymentError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<partner_payments::Model, PaymentError> {
        partner_payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::NotFound(id))
    }

    async fn check_refs(
        &self,
        brand_id: Option<Uuid>,
        flow_id: Option<Uuid>,
        payment_method_id: Option<Uuid>,
    ) -> Result<(), PaymentError> {
        if let Some(id) = brand_id {
            ensure_exists!(&self.db, brands::Entity, id, PaymentError::UnknownReference { field: "brand_id", id });
        }
        if let Some(id) = flow_id {
            ensure_exists!(&self.db, flows::Entity, id, PaymentError::UnknownReference { field: "flow_id", id });
        }
        if let Some(id) = payment_method_id {
            ensure_exists!(
                &self.db,
                payment_methods::Entity,
                id,
                PaymentError::UnknownReference { field: "payment_method_id", id }
            );
        }
        Ok(())
    }

    /// Creates a pending payment.
    pub async fn create(
        &self,
        input: CreatePaymentInput,
    ) -> Result<partner_payments::Model, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount);
        }
        check_period(input.period_from, input.period_to)?;
        self.check_refs(Some(input.brand_id), input.flow_id, input.payment_method_id)
            .await?;

        let now = chrono::Utc::now().into();
        let payment = partner_payments::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(input.brand_id),
            flow_id: Set(input.flow_id),
            payment_method_id: Set(input.payment_method_id),
            amount: Set(input.amount),
            currency: Set(input.currency),
            status: Set(PaymentStatus::Pending),
            reference: Set(input.reference),
            period_from: Set(input.period_from),
            period_to: Set(input.period_to),
            comment: Set(input.comment),
            created_by: Set(input.created_by),
            status_changed_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(payment.insert(&self.db).await?)
    }

    /// Updates a pending or held payment.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePaymentInput,
    ) -> Result<partner_payments::Model, PaymentError> {
        let payment = self.get(id).await?;
        PaymentWorkflow::ensure_editable(payment.status.into())?;

        if input.amount.is_some_and(|amount| amount <= Decimal::ZERO) {
            return Err(PaymentError::NonPositiveAmount);
        }
        check_period(
            input.period_from.unwrap_or(payment.period_from),
            input.period_to.unwrap_or(payment.period_to),
        )?;
        self.check_refs(
            input.brand_id,
            input.flow_id.flatten(),
            input.payment_method_id.flatten(),
        )
        .await?;

        let mut active: partner_payments::ActiveModel = payment.into();
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(flow_id) = input.flow_id {
            active.flow_id = Set(flow_id);
        }
        if let Some(method) = input.payment_method_id {
            active.payment_method_id = Set(method);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(reference) = input.reference {
            active.reference = Set(reference);
        }
        if let Some(period_from) = input.period_from {
            active.period_from = Set(period_from);
        }
        if let Some(period_to) = input.period_to {
            active.period_to = Set(period_to);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(comment);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Moves a payment to `next`, optionally replacing its comment.
    ///
    /// The row is locked for the duration of the check and write.
    pub async fn change_status(
        &self,
        id: Uuid,
        next: PaymentStatus,
        comment: Option<String>,
    ) -> Result<partner_payments::Model, PaymentError> {
        let txn = self.db.begin().await?;

        let payment = partner_payments::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PaymentError::NotFound(id))?;
        let next = PaymentWorkflow::transition(payment.status.into(), next.into())?;

        let now = chrono::Utc::now().into();
        let mut active: partner_payments::ActiveModel = payment.into();
        active.status = Set(next.into());
        if let Some(comment) = comment {
            active.comment = Set(Some(comment));
        }
        active.status_changed_at = Set(now);
        active.updated_at = Set(now);

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Deletes a pending payment.
    pub async fn delete(&self, id: Uuid) -> Result<(), PaymentError> {
        let payment = self.get(id).await?;
        PaymentWorkflow::ensure_deletable(payment.status.into())?;
        partner_payments::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_period() {
        let jan1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let jan31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        assert!(check_period(Some(jan1), Some(jan31)).is_ok());
        assert!(check_period(Some(jan1), Some(jan1)).is_ok());
        assert!(check_period(None, Some(jan1)).is_ok());
        assert!(matches!(
            check_period(Some(jan31), Some(jan1)),
            Err(PaymentError::InvalidPeriod)
        ));
    }
}
