//! Bizdev request routes.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::{Permission, UserRole};
use affdesk_db::BizdevRepository;
use affdesk_db::entities::sea_orm_active_enums::BizdevStatus;
use affdesk_db::repositories::{BizdevFilter, CreateBizdevInput, UpdateBizdevInput};
use affdesk_shared::types::PageRequest;

use crate::AppState;
use crate::extractors::{PathParams, QueryParams, ValidatedJson, double_option, not_blank};
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created, message, ok};

/// Creates the bizdev request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bizdev-requests", get(list_requests).post(create_request))
        .route(
            "/bizdev-requests/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
}

/// Query parameters for listing requests.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    /// Filter by status.
    pub status: Option<BizdevStatus>,
    /// Filter by brand.
    pub brand_id: Option<Uuid>,
    /// Filter by geo.
    pub geo_id: Option<Uuid>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for opening a request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestBody {
    /// Short title.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: String,
    /// Details.
    pub description: Option<String>,
    /// Brand concerned.
    pub brand_id: Option<Uuid>,
    /// Geo concerned.
    pub geo_id: Option<Uuid>,
    /// Assignee.
    pub assignee_id: Option<Uuid>,
}

/// Request body for updating a request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRequestBody {
    /// New title.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub title: Option<String>,
    /// New details; `null` clears them.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New brand; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub brand_id: Option<Option<Uuid>>,
    /// New geo; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub geo_id: Option<Option<Uuid>>,
    /// New status.
    pub status: Option<BizdevStatus>,
    /// New assignee; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// GET /bizdev-requests
async fn list_requests(
    State(state): State<AppState>,
    _auth: AuthUser,
    QueryParams(query): QueryParams<ListRequestsQuery>,
) -> ApiResult {
    let filter = BizdevFilter {
        status: query.status,
        brand_id: query.brand_id,
        geo_id: query.geo_id,
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let requests = BizdevRepository::new(state.db()).list(filter, page).await?;
    Ok(ok(requests))
}

/// GET /bizdev-requests/{id}
async fn get_request(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let request = BizdevRepository::new(state.db()).get(id).await?;
    Ok(ok(request))
}

/// POST /bizdev-requests
async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateRequestBody>,
) -> ApiResult {
    auth.require(Permission::ManageBizdevRequests)?;

    let input = CreateBizdevInput {
        title: payload.title.trim().to_string(),
        description: payload.description,
        brand_id: payload.brand_id,
        geo_id: payload.geo_id,
        assignee_id: payload.assignee_id,
        created_by: auth.user_id(),
    };
    let request = BizdevRepository::new(state.db()).create(input).await?;

    info!(request_id = %request.id, created_by = %auth.user_id(), "Bizdev request created");
    Ok(created(request))
}

/// PATCH /bizdev-requests/{id}
///
/// Bizdev users edit only requests they opened.
async fn update_request(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRequestBody>,
) -> ApiResult {
    auth.require(Permission::ManageBizdevRequests)?;

    let repo = BizdevRepository::new(state.db());
    let existing = repo.get(id).await?;
    if auth.role() == UserRole::BizDev && existing.created_by != auth.user_id() {
        return Err(ApiError::forbidden("You can only edit your own requests"));
    }

    let input = UpdateBizdevInput {
        title: payload.title.map(|title| title.trim().to_string()),
        description: payload.description,
        brand_id: payload.brand_id,
        geo_id: payload.geo_id,
        status: payload.status,
        assignee_id: payload.assignee_id,
    };
    let request = repo.update(existing.id, input).await?;

    info!(request_id = %request.id, status = ?request.status, "Bizdev request updated");
    Ok(ok(request))
}

/// DELETE /bizdev-requests/{id}
async fn delete_request(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    if auth.role() != UserRole::Admin {
        return Err(ApiError::forbidden("Only administrators can delete requests"));
    }
    BizdevRepository::new(state.db()).delete(id).await?;

    info!(request_id = %id, "Bizdev request deleted");
    Ok(message("Request deleted"))
}
