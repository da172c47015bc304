//! Organization routes: departments and teams.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::Permission;
use affdesk_db::repositories::{
    CreateDepartmentInput, CreateTeamInput, OrganizationRepository, UpdateDepartmentInput,
    UpdateTeamInput,
};

use crate::AppState;
use crate::extractors::{PathParams, QueryParams, ValidatedJson, double_option, not_blank};
use crate::middleware::AuthUser;
use crate::response::{ApiResult, created, message, ok};

/// Creates the organization routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route("/teams", get(list_teams).post(create_team))
        .route(
            "/teams/{id}",
            get(get_team).patch(update_team).delete(delete_team),
        )
}

/// Request body for creating a department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

/// Request body for updating a department.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Request body for creating a team.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Unique name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,
    /// Owning department.
    pub department_id: Option<Uuid>,
    /// Team lead.
    pub lead_id: Option<Uuid>,
}

/// Request body for updating a team.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    /// New name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,
    /// New department; `null` detaches the team.
    #[serde(default, deserialize_with = "double_option")]
    pub department_id: Option<Option<Uuid>>,
    /// New lead; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub lead_id: Option<Option<Uuid>>,
}

/// Query parameters for listing teams.
#[derive(Debug, Default, Deserialize)]
pub struct ListTeamsQuery {
    /// Only teams of this department.
    pub department_id: Option<Uuid>,
}

async fn list_departments(State(state): State<AppState>, _auth: AuthUser) -> ApiResult {
    let departments = OrganizationRepository::new(state.db())
        .list_departments()
        .await?;
    Ok(ok(departments))
}

async fn get_department(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let department = OrganizationRepository::new(state.db())
        .find_department(id)
        .await?;
    Ok(ok(department))
}

async fn create_department(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateDepartmentRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let department = OrganizationRepository::new(state.db())
        .create_department(CreateDepartmentInput {
            name: payload.name.trim().to_string(),
            description: payload.description,
        })
        .await?;

    info!(department_id = %department.id, name = %department.name, "Department created");
    Ok(created(department))
}

async fn update_department(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateDepartmentRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let department = OrganizationRepository::new(state.db())
        .update_department(
            id,
            UpdateDepartmentInput {
                name: payload.name.map(|name| name.trim().to_string()),
                description: payload.description,
            },
        )
        .await?;

    info!(department_id = %department.id, "Department updated");
    Ok(ok(department))
}

async fn delete_department(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;
    OrganizationRepository::new(state.db())
        .delete_department(id)
        .await?;

    info!(department_id = %id, "Department deleted");
    Ok(message("Department deleted"))
}

async fn list_teams(
    State(state): State<AppState>,
    _auth: AuthUser,
    QueryParams(query): QueryParams<ListTeamsQuery>,
) -> ApiResult {
    let teams = OrganizationRepository::new(state.db())
        .list_teams(query.department_id)
        .await?;
    Ok(ok(teams))
}

async fn get_team(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    let team = OrganizationRepository::new(state.db()).find_team(id).await?;
    Ok(ok(team))
}

async fn create_team(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateTeamRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let team = OrganizationRepository::new(state.db())
        .create_team(CreateTeamInput {
            name: payload.name.trim().to_string(),
            department_id: payload.department_id,
            lead_id: payload.lead_id,
        })
        .await?;

    info!(team_id = %team.id, name = %team.name, "Team created");
    Ok(created(team))
}

async fn update_team(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateTeamRequest>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;

    let team = OrganizationRepository::new(state.db())
        .update_team(
            id,
            UpdateTeamInput {
                name: payload.name.map(|name| name.trim().to_string()),
                department_id: payload.department_id,
                lead_id: payload.lead_id,
            },
        )
        .await?;

    info!(team_id = %team.id, "Team updated");
    Ok(ok(team))
}

async fn delete_team(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageDirectory)?;
    OrganizationRepository::new(state.db()).delete_team(id).await?;

    info!(team_id = %id, "Team deleted");
    Ok(message("Team deleted"))
}
