//! Expense repository.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use affdesk_core::finance::{ExpenseEntry, ExpenseSummary};
use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{departments, expenses, flows, teams};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense not found.
    #[error("Expense not found: {0}")]
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

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExpenseError> for AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::NotFound(_) => Self::NotFound(err.to_string()),
            ExpenseError::UnknownReference { field, .. } => Self::field(field, err.to_string()),
            ExpenseError::NonPositiveAmount => Self::field("amount", err.to_string()),
            ExpenseError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// Category.
    pub category: String,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Day the expense happened.
    pub expense_date: NaiveDate,
    /// Description.
    pub description: Option<String>,
    /// Department charged.
    pub department_id: Option<Uuid>,
    /// Team charged.
    pub team_id: Option<Uuid>,
    /// Flow charged.
    pub flow_id: Option<Uuid>,
    /// Author.
    pub created_by: Uuid,
}

/// Input for updating an expense.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// Category.
    pub category: Option<String>,
    /// Amount.
    pub amount: Option<Decimal>,
    /// Currency code.
    pub currency: Option<String>,
    /// Day.
    pub expense_date: Option<NaiveDate>,
    /// Description.
    pub description: Option<Option<String>>,
    /// Department.
    pub department_id: Option<Option<Uuid>>,
    /// Team.
    pub team_id: Option<Option<Uuid>>,
    /// Flow.
    pub flow_id: Option<Option<Uuid>>,
}

/// Filter options for listing expenses.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    /// Exact category.
    pub category: Option<String>,
    /// On or after.
    pub from: Option<NaiveDate>,
    /// On or before.
    pub to: Option<NaiveDate>,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Team.
    pub team_id: Option<Uuid>,
    /// Flow.
    pub flow_id: Option<Uuid>,
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists expenses, most recent first.
    pub async fn list(
        &self,
        filter: ExpenseFilter,
        page: PageRequest,
    ) -> Result<PageResponse<expenses::Model>, ExpenseError> {
        let mut query = expenses::Entity::find();

        if let Some(category) = filter.category {
            query = query.filter(expenses::Column::Category.eq(category));
        }
        if let Some(from) = filter.from {
            query = query.filter(expenses::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expenses::Column::ExpenseDate.lte(to));
        }
        if let Some(department_id) = filter.department_id {
            query = query.filter(expenses::Column::DepartmentId.eq(department_id));
        }
        if let Some(team_id) = filter.team_id {
            query = query.filter(expenses::Column::TeamId.eq(team_id));
        }
        if let Some(flow_id) = filter.flow_id {
            query = query.filter(expenses::Column::FlowId.eq(flow_id));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(expenses::Column::ExpenseDate)
            .order_by_desc(expenses::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Totals by category and currency for expenses in `[from, to]`.
    pub async fn summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<ExpenseSummary, ExpenseError> {
        let mut query = expenses::Entity::find().select_only().columns([
            expenses::Column::Category,
            expenses::Column::Currency,
            expenses::Column::Amount,
        ]);
        if let Some(from) = from {
            query = query.filter(expenses::Column::ExpenseDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(expenses::Column::ExpenseDate.lte(to));
        }

        let entries: Vec<ExpenseEntry> = query
            .into_tuple::<(String, String, Decimal)>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(category, currency, amount)| ExpenseEntry {
                category,
                currency,
                amount,
            })
            .collect();

        Ok(ExpenseSummary::build(&entries))
    }

    /// Loads an expense or fails with `ExpenseError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<expenses::Model, ExpenseError> {
        expenses::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(id))
    }

    async fn check_refs(
        &self,
        department_id: Option<Uuid>,
        team_id: Option<Uuid>,
        flow_id: Option<Uuid>,
    ) -> Result<(), ExpenseError> {
        if let Some(id) = department_id {
            ensure_exists!(
                &self.db,
                departments::Entity,
                id,
                ExpenseError::UnknownReference { field: "department_id", id }
            );
        }
        if let Some(id) = team_id {
            ensure_exists!(&self.db, teams::Entity, id, ExpenseError::UnknownReference { field: "team_id", id });
        }
        if let Some(id) = flow_id {
            ensure_exists!(&self.db, flows::Entity, id, ExpenseError::UnknownReference { field: "flow_id", id });
        }
        Ok(())
    }

    /// Creates an expense.
    pub async fn create(&self, input: CreateExpenseInput) -> Result<expenses::Model, ExpenseError> {
        if input.amount <= Decimal::ZERO {
            return Err(ExpenseError::NonPositiveAmount);
        }
        self.check_refs(input.department_id, input.team_id, input.flow_id)
            .await?;

        let now = chrono::Utc::now().into();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(input.category),
            amount: Set(input.amount),
            currency: Set(input.currency),
            expense_date: Set(input.expense_date),
            description: Set(input.description),
            department_id: Set(input.department_id),
            team_id: Set(input.team_id),
            flow_id: Set(input.flow_id),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(expense.insert(&self.db).await?)
    }

    /// Updates an expense.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateExpenseInput,
    ) -> Result<expenses::Model, ExpenseError> {
        let expense = self.get(id).await?;
        if input.amount.is_some_and(|amount| amount <= Decimal::ZERO) {
            return Err(ExpenseError::NonPositiveAmount);
        }
        self.check_refs(
            input.department_id.flatten(),
            input.team_id.flatten(),
            input.flow_id.flatten(),
        )
        .await?;

        let mut active: expenses::ActiveModel = expense.into();
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(expense_date) = input.expense_date {
            active.expense_date = Set(expense_date);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(department_id);
        }
        if let Some(team_id) = input.team_id {
            active.team_id = Set(team_id);
        }
        if let Some(flow_id) = input.flow_id {
            active.flow_id = Set(flow_id);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an expense.
    pub async fn delete(&self, id: Uuid) -> Result<(), ExpenseError> {
        let result = expenses::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(ExpenseError::NotFound(id));
        }
        Ok(())
    }
}
