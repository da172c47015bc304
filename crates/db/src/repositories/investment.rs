//! Investment operation repository.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use affdesk_core::finance::{InvestmentEntry, InvestmentSummary};
use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::db_error;
use crate::entities::{investment_operations, sea_orm_active_enums::OperationType};

/// Error types for investment operations.
#[derive(Debug, thiserror::Error)]
pub enum InvestmentError {
    /// Operation not found.
    #[error("Investment operation not found: {0}")]
    NotFound(Uuid),

    /// Amount must be positive.
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// Investor name is blank.
    #[error("Investor must not be empty")]
    EmptyInvestor,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvestmentError> for AppError {
    fn from(err: InvestmentError) -> Self {
        match err {
            InvestmentError::NotFound(_) => Self::NotFound(err.to_string()),
            InvestmentError::NonPositiveAmount => Self::field("amount", err.to_string()),
            InvestmentError::EmptyInvestor => Self::field("investor", err.to_string()),
            InvestmentError::Database(e) => db_error(e),
        }
    }
}

/// Input for recording an operation.
#[derive(Debug, Clone)]
pub struct CreateInvestmentInput {
    /// Investor name.
    pub investor: String,
    /// Operation kind.
    pub operation_type: OperationType,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Day of the operation.
    pub operation_date: NaiveDate,
    /// Comment.
    pub comment: Option<String>,
    /// Author.
    pub created_by: Uuid,
}

/// Input for updating an operation.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvestmentInput {
    /// Investor name.
    pub investor: Option<String>,
    /// Operation kind.
    pub operation_type: Option<OperationType>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Currency code.
    pub currency: Option<String>,
    /// Day.
    pub operation_date: Option<NaiveDate>,
    /// Comment.
    pub comment: Option<Option<String>>,
}

/// Filter options for listing operations.
#[derive(Debug, Clone, Default)]
pub struct InvestmentFilter {
    /// Exact investor name.
    pub investor: Option<String>,
    /// Operation kind.
    pub operation_type: Option<OperationType>,
    /// On or after.
    pub from: Option<NaiveDate>,
    /// On or before.
    pub to: Option<NaiveDate>,
}

impl InvestmentFilter {
    fn apply(
        &self,
        mut query: sea_orm::Select<investment_operations::Entity>,
    ) -> sea_orm::Select<investment_operations::Entity> {
        if let Some(investor) = &self.investor {
            query = query.filter(investment_operations::Column::Investor.eq(investor.as_str()));
        }
        if let Some(operation_type) = self.operation_type {
            query = query.filter(investment_operations::Column::OperationType.eq(operation_type));
        }
        if let Some(from) = self.from {
            query = query.filter(investment_operations::Column::OperationDate.gte(from));
        }
        if let Some(to) = self.to {
            query = query.filter(investment_operations::Column::OperationDate.lte(to));
        }
        query
    }
}

/// Investment operation repository.
#[derive(Debug, Clone)]
pub struct InvestmentRepository {
    db: DatabaseConnection,
}

impl InvestmentRepository {
    /// Creates a new investment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists operations, most recent first.
    pub async fn list(
        &self,
        filter: &InvestmentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<investment_operations::Model>, InvestmentError> {
        let query = filter.apply(investment_operations::Entity::find());

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(investment_operations::Column::OperationDate)
            .order_by_desc(investment_operations::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Per-currency and per-investor positions of the matching operations.
    pub async fn summary(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<InvestmentSummary, InvestmentError> {
        let entries: Vec<InvestmentEntry> = filter
            .apply(investment_operations::Entity::find())
            .select_only()
            .columns([
                investment_operations::Column::Investor,
                investment_operations::Column::OperationType,
                investment_operations::Column::Amount,
                investment_operations::Column::Currency,
            ])
            .into_tuple::<(String, OperationType, Decimal, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(investor, operation_type, amount, currency)| InvestmentEntry {
                investor,
                operation_type: operation_type.into(),
                amount,
                currency,
            })
            .collect();

        Ok(InvestmentSummary::build(&entries))
    }

    /// Loads an operation or fails with `InvestmentError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<investment_operations::Model, InvestmentError> {
        investment_operations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvestmentError::NotFound(id))
    }

    /// Records an operation.
    pub async fn create(
        &self,
        input: CreateInvestmentInput,
    ) -> Result<investment_operations::Model, InvestmentError> {
        if input.amount <= Decimal::ZERO {
            return Err(InvestmentError::NonPositiveAmount);
        }
        let investor = input.investor.trim().to_string();
        if investor.is_empty() {
            return Err(InvestmentError::EmptyInvestor);
        }

        let now = chrono::Utc::now().into();
        let operation = investment_operations::ActiveModel {
            id: Set(Uuid::new_v4()),
            investor: Set(investor),
            operation_type: Set(input.operation_type),
            amount: Set(input.amount),
            currency: Set(input.currency),
            operation_date: Set(input.operation_date),
            comment: Set(input.comment),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(operation.insert(&self.db).await?)
    }

    /// Updates an operation.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateInvestmentInput,
    ) -> Result<investment_operations::Model, InvestmentError> {
        let operation = self.get(id).await?;
        if input.amount.is_some_and(|amount| amount <= Decimal::ZERO) {
            return Err(InvestmentError::NonPositiveAmount);
        }

        let mut active: investment_operations::ActiveModel = operation.into();
        if let Some(investor) = input.investor {
            let investor = investor.trim().to_string();
            if investor.is_empty() {
                return Err(InvestmentError::EmptyInvestor);
            }
            active.investor = Set(investor);
        }
        if let Some(operation_type) = input.operation_type {
            active.operation_type = Set(operation_type);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(operation_date) = input.operation_date {
            active.operation_date = Set(operation_date);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(comment);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an operation.
    pub async fn delete(&self, id: Uuid) -> Result<(), InvestmentError> {
        let result = investment_operations::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(InvestmentError::NotFound(id));
        }
        Ok(())
    }
}
