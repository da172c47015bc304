//! Expense routes.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::Permission;
use affdesk_db::ExpenseRepository;
use affdesk_db::repositories::{CreateExpenseInput, ExpenseFilter, UpdateExpenseInput};
use affdesk_shared::types::PageRequest;

use super::currency;
use crate::AppState;
use crate::extractors::{
    PathParams, QueryParams, ValidatedJson, double_option, not_blank, positive_amount,
};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, created, message, ok};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/summary", get(expense_summary))
        .route(
            "/expenses/{id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
}

/// Query parameters for listing expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesQuery {
    /// Filter by category.
    pub category: Option<String>,
    /// Spent on or after.
    pub from: Option<NaiveDate>,
    /// Spent on or before.
    pub to: Option<NaiveDate>,
    /// Filter by department.
    pub department_id: Option<Uuid>,
    /// Filter by team.
    pub team_id: Option<Uuid>,
    /// Filter by flow.
    pub flow_id: Option<Uuid>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Date window for the summary.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
}

/// Request body for creating an expense.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    /// Category, e.g. `tools`.
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: String,
    /// Amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Day of the expense.
    pub expense_date: NaiveDate,
    /// Description.
    pub description: Option<String>,
    /// Department charged.
    pub department_id: Option<Uuid>,
    /// Team charged.
    pub team_id: Option<Uuid>,
    /// Flow charged.
    pub flow_id: Option<Uuid>,
}

/// Request body for updating an expense.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExpenseRequest {
    /// New category.
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: Option<String>,
    /// New amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New day.
    pub expense_date: Option<NaiveDate>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New department; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub department_id: Option<Option<Uuid>>,
    /// New team; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    /// New flow; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub flow_id: Option<Option<Uuid>>,
}

/// GET /expenses
async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListExpensesQuery>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;

    let filter = ExpenseFilter {
        category: query.category,
        from: query.from,
        to: query.to,
        department_id: query.department_id,
        team_id: query.team_id,
        flow_id: query.flow_id,
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let expenses = ExpenseRepository::new(state.db()).list(filter, page).await?;
    Ok(ok(expenses))
}

/// GET /expenses/summary
async fn expense_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<SummaryQuery>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;
    let summary = ExpenseRepository::new(state.db())
        .summary(query.from, query.to)
        .await?;
    Ok(ok(summary))
}

/// GET /expenses/{id}
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;
    let expense = ExpenseRepository::new(state.db()).get(id).await?;
    Ok(ok(expense))
}

/// POST /expenses
async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateExpenseRequest>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;

    let input = CreateExpenseInput {
        category: payload.category.trim().to_string(),
        amount: payload.amount,
        currency: currency(&payload.currency)?,
        expense_date: payload.expense_date,
        description: payload.description,
        department_id: payload.department_id,
        team_id: payload.team_id,
        flow_id: payload.flow_id,
        created_by: auth.user_id(),
    };
    let expense = ExpenseRepository::new(state.db()).create(input).await?;

    info!(expense_id = %expense.id, category = %expense.category, amount = %expense.amount, "Expense created");
    Ok(created(expense))
}

/// PATCH /expenses/{id}
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateExpenseRequest>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;

    let input = UpdateExpenseInput {
        category: payload.category.map(|category| category.trim().to_string()),
        amount: payload.amount,
        currency: payload.currency.as_deref().map(currency).transpose()?,
        expense_date: payload.expense_date,
        description: payload.description,
        department_id: payload.department_id,
        team_id: payload.team_id,
        flow_id: payload.flow_id,
    };
    let expense = ExpenseRepository::new(state.db()).update(id, input).await?;

    info!(expense_id = %expense.id, "Expense updated");
    Ok(ok(expense))
}

/// DELETE /expenses/{id}
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageExpenses)?;
    ExpenseRepository::new(state.db()).delete(id).await?;

    info!(expense_id = %id, "Expense deleted");
    Ok(message("Expense deleted"))
}
