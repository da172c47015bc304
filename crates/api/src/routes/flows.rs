//! Flow routes: configuration and membership.

use axum::{
    Router,
    extract::State,
    routing::{delete, get},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::{Permission, UserRole};
use affdesk_core::flow::{FlowStatus, FlowType, KpiMetric, PercentageRange};
use affdesk_db::entities::{flows, users};
use affdesk_db::repositories::{CreateFlowInput, FlowFilter, FlowScope, UpdateFlowInput};
use affdesk_db::FlowRepository;
use affdesk_shared::types::PageRequest;

use super::{currency, visible_flow};
use crate::AppState;
use crate::extractors::{
    PathParams, QueryParams, ValidatedJson, double_option, not_blank, within_money_range,
    within_target_range,
};
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created, message, ok};

/// Creates the flow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flows", get(list_flows).post(create_flow))
        .route(
            "/flows/{id}",
            get(get_flow).patch(update_flow).delete(delete_flow),
        )
        .route("/flows/{id}/users", get(list_members).post(add_member))
        .route("/flows/{id}/users/{user_id}", delete(remove_member))
}

/// Query parameters for listing flows.
#[derive(Debug, Default, Deserialize)]
pub struct ListFlowsQuery {
    /// Filter by status.
    pub status: Option<FlowStatus>,
    /// Filter by type.
    pub flow_type: Option<FlowType>,
    /// Filter by brand.
    pub brand_id: Option<Uuid>,
    /// Filter by geo.
    pub geo_id: Option<Uuid>,
    /// Filter by team.
    pub team_id: Option<Uuid>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a flow.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFlowRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    /// Brand.
    pub brand_id: Uuid,
    /// Geo.
    pub geo_id: Uuid,
    /// Team; a team lead's flows default to their own team.
    pub team_id: Option<Uuid>,
    /// Owner; defaults to the caller.
    pub owner_id: Option<Uuid>,
    /// Revenue model.
    pub flow_type: FlowType,
    /// Initial status; defaults to active.
    pub status: Option<FlowStatus>,
    /// KPI metric.
    pub kpi_metric: KpiMetric,
    /// KPI target.
    #[validate(custom(function = "within_target_range"))]
    pub kpi_target: Decimal,
    /// Payout bands.
    #[serde(default)]
    pub percentage_ranges: Vec<PercentageRange>,
    /// Payout per deposit; required for `cpa`.
    #[validate(custom(function = "within_money_range"))]
    pub cpa_rate: Option<Decimal>,
    /// Currency code.
    pub currency: String,
    /// First day.
    pub start_date: Option<NaiveDate>,
    /// Last day.
    pub end_date: Option<NaiveDate>,
    /// Description.
    pub description: Option<String>,
}

/// Request body for updating a flow.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFlowRequest {
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New brand.
    pub brand_id: Option<Uuid>,
    /// New geo.
    pub geo_id: Option<Uuid>,
    /// New team; `null` detaches the flow.
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    /// New owner.
    pub owner_id: Option<Uuid>,
    /// New revenue model.
    pub flow_type: Option<FlowType>,
    /// New status.
    pub status: Option<FlowStatus>,
    /// New KPI metric.
    pub kpi_metric: Option<KpiMetric>,
    /// New KPI target.
    #[validate(custom(function = "within_target_range"))]
    pub kpi_target: Option<Decimal>,
    /// Replacement payout bands.
    pub percentage_ranges: Option<Vec<PercentageRange>>,
    /// New payout per deposit; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    #[validate(custom(function = "within_money_range"))]
    pub cpa_rate: Option<Option<Decimal>>,
    /// New currency.
    pub currency: Option<String>,
    /// New first day; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    /// New last day; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Request body for adding a member.
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    /// User to add.
    pub user_id: Uuid,
}

/// A flow with its members.
#[derive(Debug, Serialize)]
pub struct FlowDetail {
    /// The flow.
    #[serde(flatten)]
    pub flow: flows::Model,
    /// Assigned users.
    pub members: Vec<users::Model>,
}

/// Row scope for flow listings.
fn scope_for(auth: &AuthUser) -> FlowScope {
    match auth.role() {
        UserRole::Admin | UserRole::Finance | UserRole::BizDev => FlowScope::All,
        UserRole::TeamLead => FlowScope::Team {
            team_id: auth.team_id(),
            user_id: auth.user_id(),
        },
        UserRole::Buyer => FlowScope::Member(auth.user_id()),
    }
}

/// Loads a flow the caller may edit.
async fn managed_flow(state: &AppState, auth: &AuthUser, id: Uuid) -> ApiResult<flows::Model> {
    auth.require(Permission::ManageFlows)?;
    let flow = FlowRepository::new(state.db()).get(id).await?;
    AuthUser::ensure(auth.actor().manages_flow(flow.team_id))?;
    Ok(flow)
}

/// GET /flows
async fn list_flows(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListFlowsQuery>,
) -> ApiResult {
    let filter = FlowFilter {
        status: query.status.map(Into::into),
        flow_type: query.flow_type.map(Into::into),
        brand_id: query.brand_id,
        geo_id: query.geo_id,
        team_id: query.team_id,
        scope: scope_for(&auth),
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let flows = FlowRepository::new(state.db()).list(filter, page).await?;
    Ok(ok(flows))
}

/// GET /flows/{id}
async fn get_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let flow = visible_flow(&state, &auth, id).await?;
    let members = FlowRepository::new(state.db()).members(flow.id).await?;
    Ok(ok(FlowDetail { flow, members }))
}

/// POST /flows
async fn create_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateFlowRequest>,
) -> ApiResult {
    auth.require(Permission::ManageFlows)?;

    let team_id = match auth.role() {
        UserRole::TeamLead => payload.team_id.or(auth.team_id()),
        _ => payload.team_id,
    };
    AuthUser::ensure(auth.actor().manages_flow(team_id))?;

    let input = CreateFlowInput {
        name: payload.name.trim().to_string(),
        brand_id: payload.brand_id,
        geo_id: payload.geo_id,
        team_id,
        owner_id: payload.owner_id.unwrap_or(auth.user_id()),
        flow_type: payload.flow_type.into(),
        status: payload.status.unwrap_or(FlowStatus::Active).into(),
        kpi_metric: payload.kpi_metric.into(),
        kpi_target: payload.kpi_target,
        percentage_ranges: payload.percentage_ranges,
        cpa_rate: payload.cpa_rate,
        currency: currency(&payload.currency)?,
        start_date: payload.start_date,
        end_date: payload.end_date,
        description: payload.description,
    };
    let flow = FlowRepository::new(state.db()).create(input).await?;

    info!(flow_id = %flow.id, name = %flow.name, created_by = %auth.user_id(), "Flow created");
    Ok(created(flow))
}

/// PATCH /flows/{id}
async fn update_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateFlowRequest>,
) -> ApiResult {
    let flow = managed_flow(&state, &auth, id).await?;
    if let Some(team_id) = payload.team_id
        && team_id != flow.team_id
    {
        AuthUser::ensure(auth.actor().manages_flow(team_id))?;
    }

    let input = UpdateFlowInput {
        name: payload.name.map(|name| name.trim().to_string()),
        brand_id: payload.brand_id,
        geo_id: payload.geo_id,
        team_id: payload.team_id,
        owner_id: payload.owner_id,
        flow_type: payload.flow_type.map(Into::into),
        status: payload.status.map(Into::into),
        kpi_metric: payload.kpi_metric.map(Into::into),
        kpi_target: payload.kpi_target,
        percentage_ranges: payload.percentage_ranges,
        cpa_rate: payload.cpa_rate,
        currency: payload.currency.as_deref().map(currency).transpose()?,
        start_date: payload.start_date,
        end_date: payload.end_date,
        description: payload.description,
    };
    let flow = FlowRepository::new(state.db()).update(flow.id, input).await?;

    info!(flow_id = %flow.id, updated_by = %auth.user_id(), "Flow updated");
    Ok(ok(flow))
}

/// DELETE /flows/{id}
async fn delete_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    if auth.role() != UserRole::Admin {
        return Err(ApiError::forbidden("Only administrators can delete flows"));
    }
    FlowRepository::new(state.db()).delete(id).await?;

    info!(flow_id = %id, deleted_by = %auth.user_id(), "Flow deleted");
    Ok(message("Flow deleted"))
}

/// GET /flows/{id}/users
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let flow = visible_flow(&state, &auth, id).await?;
    let members = FlowRepository::new(state.db()).members(flow.id).await?;
    Ok(ok(members))
}

/// POST /flows/{id}/users
async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddMemberRequest>,
) -> ApiResult {
    let flow = managed_flow(&state, &auth, id).await?;
    FlowRepository::new(state.db())
        .add_member(flow.id, payload.user_id)
        .await?;

    info!(flow_id = %flow.id, user_id = %payload.user_id, "Flow member added");
    Ok(message("User added to flow"))
}

/// DELETE /flows/{id}/users/{user_id}
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((id, user_id)): PathParams<(Uuid, Uuid)>,
) -> ApiResult {
    let flow = managed_flow(&state, &auth, id).await?;
    FlowRepository::new(state.db())
        .remove_member(flow.id, user_id)
        .await?;

    info!(flow_id = %flow.id, user_id = %user_id, "Flow member removed");
    Ok(message("User removed from flow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let body: UpdateFlowRequest =
            serde_json::from_str(r#"{"team_id": null, "cpa_rate": "1.50"}"#).unwrap();
        assert_eq!(body.team_id, Some(None));
        assert_eq!(body.cpa_rate, Some(Some(Decimal::new(150, 2))));
        assert_eq!(body.end_date, None);
    }

    #[test]
    fn test_create_request_defaults() {
        let body: CreateFlowRequest = serde_json::from_str(&format!(
            r#"{{"name": "DE spend", "brand_id": "{id}", "geo_id": "{id}",
                "flow_type": "spend", "kpi_metric": "roi", "kpi_target": "30",
                "currency": "usd"}}"#,
            id = Uuid::nil()
        ))
        .unwrap();
        assert!(body.percentage_ranges.is_empty());
        assert_eq!(body.status, None);
        assert_eq!(body.flow_type, FlowType::Spend);
    }
}
