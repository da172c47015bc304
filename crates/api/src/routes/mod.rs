//! API route definitions.

use axum::{Router, middleware};
use uuid::Uuid;

use affdesk_db::FlowRepository;
use affdesk_db::entities::flows as flow_entity;
use affdesk_shared::AppError;
use affdesk_shared::types::Currency;

use crate::response::{ApiError, ApiResult};
use crate::{AppState, middleware::AuthUser, middleware::auth_middleware};

pub mod auth;
pub mod bizdev_requests;
pub mod communications;
pub mod directory;
pub mod expenses;
pub mod flow_stats;
pub mod flows;
pub mod health;
pub mod investments;
pub mod organization;
pub mod payments;
pub mod salaries;
pub mod users;

/// Creates the API router: public health and auth routes plus everything
/// behind the auth middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(directory::routes())
        .merge(organization::routes())
        .merge(flows::routes())
        .merge(flow_stats::routes())
        .merge(salaries::routes())
        .merge(payments::routes())
        .merge(expenses::routes())
        .merge(investments::routes())
        .merge(bizdev_requests::routes())
        .merge(communications::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}

/// Upper-cases and checks a currency code.
pub(crate) fn currency(code: &str) -> Result<String, ApiError> {
    Currency::normalize(code).map_err(|message| ApiError(AppError::field("currency", message)))
}

/// Loads a flow the caller may see, or fails with 404/403.
pub(crate) async fn visible_flow(
    state: &AppState,
    auth: &AuthUser,
    flow_id: Uuid,
) -> ApiResult<flow_entity::Model> {
    let repo = FlowRepository::new(state.db());
    let flow = repo.get(flow_id).await?;
    let actor = auth.actor();

    if actor.sees_flow(flow.team_id, flow.owner_id, false) {
        return Ok(flow);
    }
    let is_member = repo.is_member(flow.id, actor.user_id).await?;
    AuthUser::ensure(actor.sees_flow(flow.team_id, flow.owner_id, is_member))?;
    Ok(flow)
}
