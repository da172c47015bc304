//! Salary routes: records, review and payout.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::{Permission, UserRole};
use affdesk_core::workflow::SalaryStatus;
use affdesk_db::entities::salaries;
use affdesk_db::repositories::{CreateSalaryInput, SalaryFilter, UpdateSalaryInput};
use affdesk_db::{SalaryRepository, UserRepository};
use affdesk_shared::types::PageRequest;

use super::currency;
use crate::AppState;
use crate::extractors::{
    PathParams, QueryParams, ValidatedJson, double_option, non_negative_amount, not_blank,
};
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created, message, ok};

/// Creates the salary routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/salaries", get(list_salaries).post(create_salary))
        .route(
            "/salaries/{id}",
            get(get_salary).patch(update_salary).delete(delete_salary),
        )
        .route("/salaries/{id}/approve", post(approve_salary))
        .route("/salaries/{id}/reject", post(reject_salary))
        .route("/salaries/{id}/pay", post(pay_salary))
}

/// Query parameters for listing salaries.
#[derive(Debug, Default, Deserialize)]
pub struct ListSalariesQuery {
    /// Filter by user.
    pub user_id: Option<Uuid>,
    /// Filter by status.
    pub status: Option<SalaryStatus>,
    /// Filter by year.
    pub year: Option<i32>,
    /// Filter by month.
    pub month: Option<i32>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a salary.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalaryRequest {
    /// Employee.
    pub user_id: Uuid,
    /// Year of the period.
    pub period_year: i32,
    /// Month of the period.
    pub period_month: i32,
    /// Base pay.
    #[validate(custom(function = "non_negative_amount"))]
    pub base_amount: Decimal,
    /// Bonus; defaults to zero.
    #[serde(default)]
    #[validate(custom(function = "non_negative_amount"))]
    pub bonus_amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Comment.
    pub comment: Option<String>,
}

/// Request body for updating a pending salary.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSalaryRequest {
    /// New base pay.
    #[validate(custom(function = "non_negative_amount"))]
    pub base_amount: Option<Decimal>,
    /// New bonus.
    #[validate(custom(function = "non_negative_amount"))]
    pub bonus_amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New comment; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
}

/// Request body for rejecting a salary.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectSalaryRequest {
    /// Why the salary was rejected.
    #[validate(custom(function = "not_blank"))]
    pub reason: String,
}

/// A salary with its computed total.
#[derive(Debug, Serialize)]
pub struct SalaryResponse {
    /// The stored record.
    #[serde(flatten)]
    pub salary: salaries::Model,
    /// `base_amount + bonus_amount`.
    pub total_amount: Decimal,
}

impl From<salaries::Model> for SalaryResponse {
    fn from(salary: salaries::Model) -> Self {
        let total_amount = salary.base_amount + salary.bonus_amount;
        Self {
            salary,
            total_amount,
        }
    }
}

/// GET /salaries
///
/// Finance and admin see every salary, team leads their team's, everyone
/// else only their own.
async fn list_salaries(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListSalariesQuery>,
) -> ApiResult {
    let mut filter = SalaryFilter {
        user_id: query.user_id,
        team_id: None,
        status: query.status.map(Into::into),
        year: query.year,
        month: query.month,
    };
    if !auth.role().can(Permission::ManageSalaries) {
        match (auth.role(), auth.team_id()) {
            (UserRole::TeamLead, Some(team_id)) => filter.team_id = Some(team_id),
            _ => filter.user_id = Some(auth.user_id()),
        }
    }
    let page = PageRequest::from_query(query.page, query.per_page);

    let salaries = SalaryRepository::new(state.db())
        .list(filter, page)
        .await?
        .map(SalaryResponse::from);
    Ok(ok(salaries))
}

/// GET /salaries/{id}
async fn get_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let salary = SalaryRepository::new(state.db()).get(id).await?;

    if salary.user_id != auth.user_id() && !auth.role().can(Permission::ManageSalaries) {
        if auth.role() != UserRole::TeamLead {
            return Err(ApiError::forbidden("Access to this salary is denied"));
        }
        let user = UserRepository::new(state.db()).get(salary.user_id).await?;
        AuthUser::ensure(auth.actor().reaches_team(user.team_id))?;
    }

    Ok(ok(SalaryResponse::from(salary)))
}

/// POST /salaries
async fn create_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSalaryRequest>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;

    let input = CreateSalaryInput {
        user_id: payload.user_id,
        period_year: payload.period_year,
        period_month: payload.period_month,
        base_amount: payload.base_amount,
        bonus_amount: payload.bonus_amount,
        currency: currency(&payload.currency)?,
        comment: payload.comment,
        created_by: auth.user_id(),
    };
    let salary = SalaryRepository::new(state.db()).create(input).await?;

    info!(
        salary_id = %salary.id,
        user_id = %salary.user_id,
        period = %format!("{}-{:02}", salary.period_year, salary.period_month),
        "Salary created"
    );
    Ok(created(SalaryResponse::from(salary)))
}

/// PATCH /salaries/{id}
async fn update_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSalaryRequest>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;

    let input = UpdateSalaryInput {
        base_amount: payload.base_amount,
        bonus_amount: payload.bonus_amount,
        currency: payload.currency.as_deref().map(currency).transpose()?,
        comment: payload.comment,
    };
    let salary = SalaryRepository::new(state.db()).update(id, input).await?;

    info!(salary_id = %salary.id, "Salary updated");
    Ok(ok(SalaryResponse::from(salary)))
}

/// DELETE /salaries/{id}
async fn delete_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;
    SalaryRepository::new(state.db()).delete(id).await?;

    info!(salary_id = %id, "Salary deleted");
    Ok(message("Salary deleted"))
}

/// POST /salaries/{id}/approve
async fn approve_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;
    let salary = SalaryRepository::new(state.db())
        .approve(id, auth.user_id())
        .await?;

    info!(salary_id = %salary.id, reviewer = %auth.user_id(), "Salary approved");
    Ok(ok(SalaryResponse::from(salary)))
}

/// POST /salaries/{id}/reject
async fn reject_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectSalaryRequest>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;
    let salary = SalaryRepository::new(state.db())
        .reject(id, auth.user_id(), &payload.reason)
        .await?;

    info!(salary_id = %salary.id, reviewer = %auth.user_id(), "Salary rejected");
    Ok(ok(SalaryResponse::from(salary)))
}

/// POST /salaries/{id}/pay
async fn pay_salary(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageSalaries)?;
    let salary = SalaryRepository::new(state.db()).pay(id).await?;

    info!(salary_id = %salary.id, paid_by = %auth.user_id(), "Salary paid");
    Ok(ok(SalaryResponse::from(salary)))
}
