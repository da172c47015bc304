//! Directory routes: brands, geos and payment methods.
//!
//! Reads are open to every authenticated user; writes need `ManageDirectory`.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::Permission;
use affdesk_db::repositories::{
    CreateBrandInput, CreateGeoInput, CreatePaymentMethodInput, DirectoryRepository,
    UpdateBrandInput, UpdateGeoInput, UpdatePaymentMethodInput,
};

use crate::AppState;
use crate::extractors::{PathParams, ValidatedJson, double_option, not_blank};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, created, message, ok};

/// Creates the directory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/{id}",
            get(get_brand).patch(update_brand).delete(delete_brand),
        )
        .route("/geos", get(list_geos).post(create_geo))
        .route("/geos/{id}", get(get_geo).patch(update_geo).delete(delete_geo))
        .route(
            "/payment-methods",
            get(list_payment_methods).post(create_payment_method),
        )
        .route(
            "/payment-methods/{id}",
            get(get_payment_method)
                .patch(update_payment_method)
                .delete(delete_payment_method),
        )
}

// ============================================================================
// Brands
// ============================================================================

/// Request body for creating a brand.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBrandRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    /// Website URL.
    #[validate(url(message = "must be a valid URL"))]
    pub website: Option<String>,
    /// Defaults to true.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request body for updating a brand.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBrandRequest {
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New website; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

const fn default_true() -> bool {
    true
}

async fn list_brands(State(state): State<AppState>, _auth: AuthUser) -> ApiResult {
    let brands = DirectoryRepository::new(state.db()).list_brands().await?;
    Ok(ok(brands))
}

async fn get_brand(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let brand = DirectoryRepository::new(state.db()).find_brand(id).await?;
    Ok(ok(brand))
}

async fn create_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateBrandRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let brand = DirectoryRepository::new(state.db())
        .create_brand(CreateBrandInput {
            name: payload.name.trim().to_string(),
            website: payload.website,
            is_active: payload.is_active,
        })
        .await?;

    info!(brand_id = %brand.id, name = %brand.name, "Brand created");
    Ok(created(brand))
}

async fn update_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateBrandRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let brand = DirectoryRepository::new(state.db())
        .update_brand(
            id,
            UpdateBrandInput {
                name: payload.name.map(|name| name.trim().to_string()),
                website: payload.website,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(brand_id = %brand.id, "Brand updated");
    Ok(ok(brand))
}

async fn delete_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;
    DirectoryRepository::new(state.db()).delete_brand(id).await?;

    info!(brand_id = %id, "Brand deleted");
    Ok(message("Brand deleted"))
}

// ============================================================================
// Geos
// ============================================================================

/// Request body for creating a geo.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGeoRequest {
    /// Country code, e.g. `DE`; stored upper case.
    #[validate(length(min = 2, max = 10), custom(function = "not_blank"))]
    pub code: String,
    /// Display name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
}

/// Request body for updating a geo.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateGeoRequest {
    /// New code.
    #[validate(length(min = 2, max = 10), custom(function = "not_blank"))]
    pub code: Option<String>,
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
}

async fn list_geos(State(state): State<AppState>, _auth: AuthUser) -> ApiResult {
    let geos = DirectoryRepository::new(state.db()).list_geos().await?;
    Ok(ok(geos))
}

async fn get_geo(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let geo = DirectoryRepository::new(state.db()).find_geo(id).await?;
    Ok(ok(geo))
}

async fn create_geo(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateGeoRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let geo = DirectoryRepository::new(state.db())
        .create_geo(CreateGeoInput {
            code: payload.code,
            name: payload.name.trim().to_string(),
        })
        .await?;

    info!(geo_id = %geo.id, code = %geo.code, "Geo created");
    Ok(created(geo))
}

async fn update_geo(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateGeoRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let geo = DirectoryRepository::new(state.db())
        .update_geo(
            id,
            UpdateGeoInput {
                code: payload.code,
                name: payload.name.map(|name| name.trim().to_string()),
            },
        )
        .await?;

    info!(geo_id = %geo.id, "Geo updated");
    Ok(ok(geo))
}

async fn delete_geo(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;
    DirectoryRepository::new(state.db()).delete_geo(id).await?;

    info!(geo_id = %id, "Geo deleted");
    Ok(message("Geo deleted"))
}

// ============================================================================
// Payment methods
// ============================================================================

/// Request body for creating a payment method.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentMethodRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    /// Free-form details (wallet, account).
    pub details: Option<String>,
    /// Defaults to true.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Request body for updating a payment method.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePaymentMethodRequest {
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New details; `null` clears them.
    #[serde(default, deserialize_with = "double_option")]
    pub details: Option<Option<String>>,
    /// New active flag.
    pub is_active: Option<bool>,
}

async fn list_payment_methods(State(state): State<AppState>, _auth: AuthUser) -> ApiResult {
    let methods = DirectoryRepository::new(state.db())
        .list_payment_methods()
        .await?;
    Ok(ok(methods))
}

async fn get_payment_method(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let method = DirectoryRepository::new(state.db())
        .find_payment_method(id)
        .await?;
    Ok(ok(method))
}

async fn create_payment_method(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreatePaymentMethodRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let method = DirectoryRepository::new(state.db())
        .create_payment_method(CreatePaymentMethodInput {
            name: payload.name.trim().to_string(),
            details: payload.details,
            is_active: payload.is_active,
        })
        .await?;

    info!(payment_method_id = %method.id, "Payment method created");
    Ok(created(method))
}

async fn update_payment_method(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdatePaymentMethodRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let method = DirectoryRepository::new(state.db())
        .update_payment_method(
            id,
            UpdatePaymentMethodInput {
                name: payload.name.map(|name| name.trim().to_string()),
                details: payload.details,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(payment_method_id = %method.id, "Payment method updated");
    Ok(ok(method))
}

async fn delete_payment_method(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;
    DirectoryRepository::new(state.db())
        .delete_payment_method(id)
        .await?;

    info!(payment_method_id = %id, "Payment method deleted");
    Ok(message("Payment method deleted"))
}
