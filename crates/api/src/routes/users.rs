//! User management routes.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::auth::{Permission, UserRole, hash_password};
use affdesk_db::repositories::{CreateUserInput, UpdateUserInput, UserFilter, UserRepository};
use affdesk_shared::types::PageRequest;

use crate::AppState;
use crate::extractors::{PathParams, QueryParams, ValidatedJson, double_option, not_blank};
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created, ok};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(deactivate_user),
        )
}

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Filter by role.
    pub role: Option<UserRole>,
    /// Filter by team.
    pub team_id: Option<Uuid>,
    /// Filter by department.
    pub department_id: Option<Uuid>,
    /// Filter by active flag.
    pub is_active: Option<bool>,
    /// Substring of name or email.
    pub search: Option<String>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for creating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Login email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Plain password; hashed before storage.
    pub password: String,
    /// Display name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub full_name: String,
    /// Role.
    pub role: UserRole,
    /// Team.
    pub team_id: Option<Uuid>,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Telegram handle.
    #[validate(length(max = 100))]
    pub telegram: Option<String>,
}

/// Request body for updating a user.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New email.
    #[validate(email(message = "must be a valid email"))]
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New display name.
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub full_name: Option<String>,
    /// New role.
    pub role: Option<UserRole>,
    /// New team; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    /// New department; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub department_id: Option<Option<Uuid>>,
    /// New Telegram handle; `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub telegram: Option<Option<String>>,
    /// Re-activates or deactivates the account.
    pub is_active: Option<bool>,
}

/// GET /users
///
/// Team leads only ever see their own team.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> ApiResult {
    auth.require(Permission::ViewUsers)?;

    let team_id = if auth.role() == UserRole::TeamLead {
        Some(
            auth.team_id()
                .ok_or_else(|| ApiError::forbidden("Team lead is not assigned to a team"))?,
        )
    } else {
        query.team_id
    };

    let filter = UserFilter {
        role: query.role.map(Into::into),
        team_id,
        department_id: query.department_id,
        is_active: query.is_active,
        search: query.search,
    };
    let page = PageRequest::from_query(query.page, query.per_page);

    let users = UserRepository::new(state.db()).list(filter, page).await?;
    Ok(ok(users))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    if id != auth.user_id() {
        auth.require(Permission::ViewUsers)?;
    }

    let user = UserRepository::new(state.db()).get(id).await?;
    AuthUser::ensure(auth.actor().reaches_user(user.id, user.team_id))?;

    Ok(ok(user))
}

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> ApiResult {
    auth.require(Permission::ManageUsers)?;

    let input = CreateUserInput {
        email: payload.email,
        password_hash: hash_password(&payload.password)?,
        full_name: payload.full_name.trim().to_string(),
        role: payload.role.into(),
        team_id: payload.team_id,
        department_id: payload.department_id,
        telegram: payload.telegram,
    };
    let user = UserRepository::new(state.db()).create(input).await?;

    info!(user_id = %user.id, created_by = %auth.user_id(), role = ?user.role, "User created");
    Ok(created(user))
}

/// PATCH /users/{id}
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> ApiResult {
    auth.require(Permission::ManageUsers)?;
    if id == auth.user_id() && payload.is_active == Some(false) {
        return Err(ApiError::forbidden("You cannot deactivate your own account"));
    }

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let input = UpdateUserInput {
        email: payload.email,
        password_hash,
        full_name: payload.full_name.map(|name| name.trim().to_string()),
        role: payload.role.map(Into::into),
        team_id: payload.team_id,
        department_id: payload.department_id,
        telegram: payload.telegram,
        is_active: payload.is_active,
    };
    let user = UserRepository::new(state.db()).update(id, input).await?;

    info!(user_id = %user.id, updated_by = %auth.user_id(), "User updated");
    Ok(ok(user))
}

/// DELETE /users/{id}
///
/// Deactivates the account; the row stays for history.
async fn deactivate_user(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    auth.require(Permission::ManageUsers)?;
    if id == auth.user_id() {
        return Err(ApiError::forbidden("You cannot deactivate your own account"));
    }

    let user = UserRepository::new(state.db()).deactivate(id).await?;

    info!(user_id = %user.id, deactivated_by = %auth.user_id(), "User deactivated");
    Ok(ok(user))
}
