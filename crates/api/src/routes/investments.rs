//! Investment operation routes.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::Permission;
use affdesk_core::finance::OperationType;
use affdesk_db::InvestmentRepository;
use affdesk_db::repositories::{CreateInvestmentInput, InvestmentFilter, UpdateInvestmentInput};
use affdesk_shared::types::PageRequest;

use super::currency;
use crate::AppState;
use crate::extractors::{
    PathParams, QueryParams, ValidatedJson, double_option, not_blank, positive_amount,
};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, created, message, ok};

/// Creates the investment operation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/investment-operations",
            get(list_operations).post(create_operation),
        )
        .route("/investment-operations/summary", get(operations_summary))
        .route(
            "/investment-operations/{id}",
            get(get_operation)
                .patch(update_operation)
                .delete(delete_operation),
        )
}

/// Query parameters shared by the list and the summary.
#[derive(Debug, Default, Deserialize)]
pub struct OperationsQuery {
    /// Exact investor name.
    pub investor: Option<String>,
    /// Operation type.
    #[serde(rename = "type")]
    pub operation_type: Option<OperationType>,
    /// On or after.
    pub from: Option<NaiveDate>,
    /// On or before.
    pub to: Option<NaiveDate>,
    /// Page number (1-based); ignored by the summary.
    pub page: Option<u32>,
    /// Items per page; ignored by the summary.
    pub per_page: Option<u32>,
}

impl OperationsQuery {
    fn filter(&self) -> InvestmentFilter {
        InvestmentFilter {
            investor: self.investor.clone(),
            operation_type: self.operation_type.map(Into::into),
            from: self.from,
            to: self.to,
        }
    }
}

/// Request body for recording an operation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOperationRequest {
    /// Investor name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub investor: String,
    /// Operation type.
    pub operation_type: OperationType,
    /// Amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// Day of the operation.
    pub operation_date: NaiveDate,
    /// Comment.
    pub comment: Option<String>,
}

/// Request body for updating an operation.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOperationRequest {
    /// New investor.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub investor: Option<String>,
    /// New type.
    pub operation_type: Option<OperationType>,
    /// New amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New day.
    pub operation_date: Option<NaiveDate>,
    /// New comment; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
}

/// GET /investment-operations
async fn list_operations(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<OperationsQuery>,
) -> ApiResult {
    auth.require(Permission::ViewInvestments)?;

    let page = PageRequest::from_query(query.page, query.per_page);
    let operations = InvestmentRepository::new(state.db())
        .list(&query.filter(), page)
        .await?;
    Ok(ok(operations))
}

/// GET /investment-operations/summary
async fn operations_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<OperationsQuery>,
) -> ApiResult {
    auth.require(Permission::ViewInvestments)?;
    let summary = InvestmentRepository::new(state.db())
        .summary(&query.filter())
        .await?;
    Ok(ok(summary))
}

/// GET /investment-operations/{id}
async fn get_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ViewInvestments)?;
    let operation = InvestmentRepository::new(state.db()).get(id).await?;
    Ok(ok(operation))
}

/// POST /investment-operations
async fn create_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateOperationRequest>,
) -> ApiResult {
    auth.require(Permission::ManageInvestments)?;

    let input = CreateInvestmentInput {
        investor: payload.investor.trim().to_string(),
        operation_type: payload.operation_type.into(),
        amount: payload.amount,
        currency: currency(&payload.currency)?,
        operation_date: payload.operation_date,
        comment: payload.comment,
        created_by: auth.user_id(),
    };
    let operation = InvestmentRepository::new(state.db()).create(input).await?;

    info!(
        operation_id = %operation.id,
        investor = %operation.investor,
        operation_type = ?operation.operation_type,
        "Investment operation recorded"
    );
    Ok(created(operation))
}

/// PATCH /investment-operations/{id}
async fn update_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateOperationRequest>,
) -> ApiResult {
    auth.require(Permission::ManageInvestments)?;

    let input = UpdateInvestmentInput {
        investor: payload.investor.map(|investor| investor.trim().to_string()),
        operation_type: payload.operation_type.map(Into::into),
        amount: payload.amount,
        currency: payload.currency.as_deref().map(currency).transpose()?,
        operation_date: payload.operation_date,
        comment: payload.comment,
    };
    let operation = InvestmentRepository::new(state.db()).update(id, input).await?;

    info!(operation_id = %operation.id, "Investment operation updated");
    Ok(ok(operation))
}

/// DELETE /investment-operations/{id}
async fn delete_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageInvestments)?;
    InvestmentRepository::new(state.db()).delete(id).await?;

    info!(operation_id = %id, "Investment operation deleted");
    Ok(message("Investment operation deleted"))
}
