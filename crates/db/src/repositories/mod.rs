//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Each repository has its own error enum that converts into `AppError`.

pub mod bizdev;
pub mod communication;
pub mod directory;
pub mod expense;
pub mod flow;
pub mod flow_stats;
pub mod investment;
pub mod organization;
pub mod payment;
pub mod salary;
pub mod user;

pub use bizdev::{
    BizdevError, BizdevFilter, BizdevRepository, CreateBizdevInput, UpdateBizdevInput,
};
pub use communication::{CommunicationError, CommunicationRepository, CreateMessageInput};
pub use directory::{
    CreateBrandInput, CreateGeoInput, CreatePaymentMethodInput, DirectoryError,
    DirectoryRepository, UpdateBrandInput, UpdateGeoInput, UpdatePaymentMethodInput,
};
pub use expense::{
    CreateExpenseInput, ExpenseError, ExpenseFilter, ExpenseRepository, UpdateExpenseInput,
};
pub use flow::{CreateFlowInput, FlowError, FlowFilter, FlowRepository, FlowScope, UpdateFlowInput};
pub use flow_stats::{FlowStatsError, FlowStatsRepository, StatsScope, UpsertDayInput};
pub use investment::{
    CreateInvestmentInput, InvestmentError, InvestmentFilter, InvestmentRepository,
    UpdateInvestmentInput,
};
pub use organization::{
    CreateDepartmentInput, CreateTeamInput, OrganizationError, OrganizationRepository,
    UpdateDepartmentInput, UpdateTeamInput,
};
pub use payment::{
    CreatePaymentInput, PaymentError, PaymentFilter, PaymentRepository, UpdatePaymentInput,
};
pub use salary::{
    CreateSalaryInput, SalaryError, SalaryFilter, SalaryRepository, UpdateSalaryInput,
};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserFilter, UserRepository};

use sea_orm::{DbErr, SqlErr};

use affdesk_shared::AppError;

/// Maps a database error onto the client-facing error.
///
/// Constraint violations that slipped past the application-level checks are
/// client errors; anything else is a 500.
pub fn db_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Record already exists".to_string())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::BusinessRule("Record is referenced by other records".to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

/// Returns early with `$err` when no row of `$entity` has primary key `$id`.
macro_rules! ensure_exists {
    ($db:expr, $entity:path, $id:expr, $err:expr) => {
        if <$entity as sea_orm::EntityTrait>::find_by_id($id)
            .one($db)
            .await?
            .is_none()
        {
            return Err($err);
        }
    };
}

pub(crate) use ensure_exists;
