//! Partner payment routes.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::Permission;
use affdesk_core::workflow::PaymentStatus;
use affdesk_db::PaymentRepository;
use affdesk_db::repositories::{CreatePaymentInput, PaymentFilter, UpdatePaymentInput};
use affdesk_shared::types::PageRequest;

use super::currency;
use crate::AppState;
use crate::extractors::{PathParams, QueryParams, ValidatedJson, double_option, positive_amount};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, created, message, ok};

/// Creates the partner payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route(
            "/payments/{id}",
            get(get_payment).patch(update_payment).delete(delete_payment),
        )
        .route("/payments/{id}/status", post(change_status))
}

/// Query parameters for listing payments.
#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
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
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a payment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    /// Paying brand.
    pub brand_id: Uuid,
    /// Flow the payment settles.
    pub flow_id: Option<Uuid>,
    /// How it is paid.
    pub payment_method_id: Option<Uuid>,
    /// Amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
    /// External reference.
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    /// Settled period start.
    pub period_from: Option<NaiveDate>,
    /// Settled period end.
    pub period_to: Option<NaiveDate>,
    /// Comment.
    pub comment: Option<String>,
}

/// Request body for updating a pending or held payment.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    /// New brand.
    pub brand_id: Option<Uuid>,
    /// New flow; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub flow_id: Option<Option<Uuid>>,
    /// New payment method; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub payment_method_id: Option<Option<Uuid>>,
    /// New amount.
    #[validate(custom(function = "positive_amount"))]
    pub amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<String>,
    /// New reference; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub reference: Option<Option<String>>,
    /// New period start; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub period_from: Option<Option<NaiveDate>>,
    /// New period end; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub period_to: Option<Option<NaiveDate>>,
    /// New comment; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    /// Target status.
    pub status: PaymentStatus,
    /// Replaces the comment when present.
    pub comment: Option<String>,
}

/// GET /payments
async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListPaymentsQuery>,
) -> ApiResult {
    auth.require(Permission::ViewPayments)?;

    let filter = PaymentFilter {
        status: query.status.map(Into::into),
        brand_id: query.brand_id,
        flow_id: query.flow_id,
        from: query.from,
        to: query.to,
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let payments = PaymentRepository::new(state.db()).list(filter, page).await?;
    Ok(ok(payments))
}

/// GET /payments/{id}
async fn get_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ViewPayments)?;
    let payment = PaymentRepository::new(state.db()).get(id).await?;
    Ok(ok(payment))
}

/// POST /payments
async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePaymentRequest>,
) -> ApiResult {
    auth.require(Permission::ManagePayments)?;

    let input = CreatePaymentInput {
        brand_id: payload.brand_id,
        flow_id: payload.flow_id,
        payment_method_id: payload.payment_method_id,
        amount: payload.amount,
        currency: currency(&payload.currency)?,
        reference: payload.reference,
        period_from: payload.period_from,
        period_to: payload.period_to,
        comment: payload.comment,
        created_by: auth.user_id(),
    };
    let payment = PaymentRepository::new(state.db()).create(input).await?;

    info!(
        payment_id = %payment.id,
        brand_id = %payment.brand_id,
        amount = %payment.amount,
        currency = %payment.currency,
        "Partner payment created"
    );
    Ok(created(payment))
}

/// PATCH /payments/{id}
async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePaymentRequest>,
) -> ApiResult {
    auth.require(Permission::ManagePayments)?;

    let input = UpdatePaymentInput {
        brand_id: payload.brand_id,
        flow_id: payload.flow_id,
        payment_method_id: payload.payment_method_id,
        amount: payload.amount,
        currency: payload.currency.as_deref().map(currency).transpose()?,
        reference: payload.reference,
        period_from: payload.period_from,
        period_to: payload.period_to,
        comment: payload.comment,
    };
    let payment = PaymentRepository::new(state.db()).update(id, input).await?;

    info!(payment_id = %payment.id, "Partner payment updated");
    Ok(ok(payment))
}

/// POST /payments/{id}/status
async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<ChangeStatusRequest>,
) -> ApiResult {
    auth.require(Permission::ManagePayments)?;

    let payment = PaymentRepository::new(state.db())
        .change_status(id, payload.status.into(), payload.comment)
        .await?;

    info!(
        payment_id = %payment.id,
        status = %payload.status,
        changed_by = %auth.user_id(),
        "Partner payment status changed"
    );
    Ok(ok(payment))
}

/// DELETE /payments/{id}
async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManagePayments)?;
    PaymentRepository::new(state.db()).delete(id).await?;

    info!(payment_id = %id, "Partner payment deleted");
    Ok(message("Payment deleted"))
}
