//! Salary repository.
//!
//! Status changes lock the row (`SELECT ... FOR UPDATE`), check the move with
//! [`SalaryWorkflow`] and write inside one transaction.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use affdesk_core::stats::{MonthPeriod, StatsError};
use affdesk_core::workflow::{SalaryAction, SalaryWorkflow, WorkflowError};
use affdesk_shared::AppError;
use affdesk_shared::types::{PageRequest, PageResponse};

use super::{db_error, ensure_exists};
use crate::entities::{salaries, sea_orm_active_enums::SalaryStatus, users};

/// Error types for salary operations.
#[derive(Debug, thiserror::Error)]
pub enum SalaryError {
    /// A salary for this user and period already exists.
    #[error("Salary for {year}-{month:02} already exists for this user")]
    DuplicatePeriod {
        /// Year.
        year: i32,
        /// Month.
        month: i32,
    },

    /// Salary not found.
    #[error("Salary not found: {0}")]
    NotFound(Uuid),

    /// Referenced user does not exist.
    #[error("User does not exist: {0}")]
    UnknownUser(Uuid),

    /// Amount below zero.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// Invalid period.
    #[error(transparent)]
    Period(#[from] StatsError),

    /// Status transition or edit refused.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SalaryError> for AppError {
    fn from(err: SalaryError) -> Self {
        match err {
            SalaryError::DuplicatePeriod { .. } => Self::Conflict(err.to_string()),
            SalaryError::NotFound(_) => Self::NotFound(err.to_string()),
            SalaryError::UnknownUser(_) => Self::field("user_id", err.to_string()),
            SalaryError::NegativeAmount(field) => Self::field(field, err.to_string()),
            SalaryError::Period(e) => e.into(),
            SalaryError::Workflow(e) => e.into(),
            SalaryError::Database(e) => db_error(e),
        }
    }
}

/// Input for creating a salary.
#[derive(Debug, Clone)]
pub struct CreateSalaryInput {
    /// Employee.
    pub user_id: Uuid,
    /// Period year.
    pub period_year: i32,
    /// Period month, 1-12.
    pub period_month: i32,
    /// Base pay.
    pub base_amount: Decimal,
    /// Bonus.
    pub bonus_amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Comment.
    pub comment: Option<String>,
    /// Author.
    pub created_by: Uuid,
}

/// Input for updating a pending salary.
#[derive(Debug, Clone, Default)]
pub struct UpdateSalaryInput {
    /// Base pay.
    pub base_amount: Option<Decimal>,
    /// Bonus.
    pub bonus_amount: Option<Decimal>,
    /// Currency code.
    pub currency: Option<String>,
    /// Comment.
    pub comment: Option<Option<String>>,
}

/// Filter options for listing salaries.
#[derive(Debug, Clone, Default)]
pub struct SalaryFilter {
    /// Filter by employee.
    pub user_id: Option<Uuid>,
    /// Filter by the employee's team.
    pub team_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<SalaryStatus>,
    /// Filter by period year.
    pub year: Option<i32>,
    /// Filter by period month.
    pub month: Option<i32>,
}

fn check_period(year: i32, month: i32) -> Result<(), StatsError> {
    let month = u32::try_from(month).map_err(|_| StatsError::InvalidMonth(0))?;
    MonthPeriod::new(year, month).map(|_| ())
}

fn check_amount(field: &'static str, amount: Decimal) -> Result<(), SalaryError> {
    if amount < Decimal::ZERO {
        return Err(SalaryError::NegativeAmount(field));
    }
    Ok(())
}

/// Salary repository.
#[derive(Debug, Clone)]
pub struct SalaryRepository {
    db: DatabaseConnection,
}

impl SalaryRepository {
    /// Creates a new salary repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists salaries, newest period first.
    pub async fn list(
        &self,
        filter: SalaryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<salaries::Model>, SalaryError> {
        let mut query = salaries::Entity::find();

        if let Some(user_id) = filter.user_id {
            query = query.filter(salaries::Column::UserId.eq(user_id));
        }
        if let Some(team_id) = filter.team_id {
            query = query
                .join(JoinType::InnerJoin, salaries::Relation::Users.def())
                .filter(users::Column::TeamId.eq(team_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(salaries::Column::Status.eq(status));
        }
        if let Some(year) = filter.year {
            query = query.filter(salaries::Column::PeriodYear.eq(year));
        }
        if let Some(month) = filter.month {
            query = query.filter(salaries::Column::PeriodMonth.eq(month));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(salaries::Column::PeriodYear)
            .order_by_desc(salaries::Column::PeriodMonth)
            .order_by_asc(salaries::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }

    /// Loads a salary or fails with `SalaryError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<salaries::Model, SalaryError> {
        salaries::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(SalaryError::NotFound(id))
    }

    /// Creates a pending salary.
    pub async fn create(&self, input: CreateSalaryInput) -> Result<salaries::Model, SalaryError> {
        check_period(input.period_year, input.period_month)?;
        check_amount("base_amount", input.base_amount)?;
        check_amount("bonus_amount", input.bonus_amount)?;
        ensure_exists!(&self.db, users::Entity, input.user_id, SalaryError::UnknownUser(input.user_id));

        let existing = salaries::Entity::find()
            .filter(salaries::Column::UserId.eq(input.user_id))
            .filter(salaries::Column::PeriodYear.eq(input.period_year))
            .filter(salaries::Column::PeriodMonth.eq(input.period_month))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(SalaryError::DuplicatePeriod {
                year: input.period_year,
                month: input.period_month,
            });
        }

        let now = chrono::Utc::now().into();
        let salary = salaries::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            period_year: Set(input.period_year),
            period_month: Set(input.period_month),
            base_amount: Set(input.base_amount),
            bonus_amount: Set(input.bonus_amount),
            currency: Set(input.currency),
            status: Set(SalaryStatus::Pending),
            comment: Set(input.comment),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            paid_at: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(salary.insert(&self.db).await?)
    }

    /// Updates amounts or comment of a pending salary.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSalaryInput,
    ) -> Result<salaries::Model, SalaryError> {
        let salary = self.get(id).await?;
        SalaryWorkflow::ensure_editable(salary.status.into())?;

        let mut active: salaries::ActiveModel = salary.into();
        if let Some(base) = input.base_amount {
            check_amount("base_amount", base)?;
            active.base_amount = Set(base);
        }
        if let Some(bonus) = input.bonus_amount {
            check_amount("bonus_amount", bonus)?;
            active.bonus_amount = Set(bonus);
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency);
        }
        if let Some(comment) = input.comment {
            active.comment = Set(comment);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a pending salary.
    pub async fn delete(&self, id: Uuid) -> Result<(), SalaryError> {
        let salary = self.get(id).await?;
        SalaryWorkflow::ensure_editable(salary.status.into())?;
        salaries::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Approves a pending salary.
    pub async fn approve(&self, id: Uuid, reviewer: Uuid) -> Result<salaries::Model, SalaryError> {
        self.transition(id, |status| SalaryWorkflow::approve(status, reviewer))
            .await
    }

    /// Rejects a pending or approved salary.
    pub async fn reject(
        &self,
        id: Uuid,
        reviewer: Uuid,
        reason: &str,
    ) -> Result<salaries::Model, SalaryError> {
        self.transition(id, |status| SalaryWorkflow::reject(status, reviewer, reason))
            .await
    }

    /// Marks an approved salary as paid.
    pub async fn pay(&self, id: Uuid) -> Result<salaries::Model, SalaryError> {
        self.transition(id, SalaryWorkflow::pay).await
    }

    async fn transition<F>(&self, id: Uuid, decide: F) -> Result<salaries::Model, SalaryError>
    where
        F: FnOnce(affdesk_core::workflow::SalaryStatus) -> Result<SalaryAction, WorkflowError>,
    {
        let txn = self.db.begin().await?;

        let salary = salaries::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(SalaryError::NotFound(id))?;
        let action = decide(salary.status.into())?;

        let mut active: salaries::ActiveModel = salary.into();
        active.status = Set(action.new_status().into());
        match action {
            SalaryAction::Approve {
                reviewed_by,
                reviewed_at,
            } => {
                active.reviewed_by = Set(Some(reviewed_by));
                active.reviewed_at = Set(Some(reviewed_at.into()));
            }
            SalaryAction::Reject {
                reviewed_by,
                reviewed_at,
                reason,
            } => {
                active.reviewed_by = Set(Some(reviewed_by));
                active.reviewed_at = Set(Some(reviewed_at.into()));
                active.comment = Set(Some(reason));
            }
            SalaryAction::Pay { paid_at } => {
                active.paid_at = Set(Some(paid_at.into()));
            }
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_check_period() {
        assert!(check_period(2026, 1).is_ok());
        assert!(check_period(2026, 12).is_ok());
        assert!(matches!(check_period(2026, 13), Err(StatsError::InvalidMonth(13))));
        assert!(matches!(check_period(2026, -1), Err(StatsError::InvalidMonth(0))));
        assert!(matches!(check_period(1999, 5), Err(StatsError::InvalidYear(1999))));
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount("base_amount", dec!(0)).is_ok());
        assert!(check_amount("base_amount", dec!(1500.00)).is_ok());
        assert!(matches!(
            check_amount("bonus_amount", dec!(-0.01)),
            Err(SalaryError::NegativeAmount("bonus_amount"))
        ));
    }
}
