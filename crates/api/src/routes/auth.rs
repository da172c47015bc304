//! Authentication routes: login, token refresh and the current user.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use affdesk_core::auth::{UserRole, verify_password};
use affdesk_db::{UserRepository, entities::users};
use affdesk_shared::TokenKind;

use crate::AppState;
use crate::extractors::ValidatedJson;
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, ok};

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Auth routes behind the middleware.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email.
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Refresh request.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Refresh token from login.
    #[validate(length(min = 1, message = "is required"))]
    pub refresh_token: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Authenticated user.
    pub user: users::Model,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult {
    let user_repo = UserRepository::new(state.db());

    let Some(user) = user_repo.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "Login attempt for unknown email");
        return Err(invalid_credentials());
    };
    if !user.is_active {
        warn!(user_id = %user.id, "Login attempt for inactive user");
        return Err(invalid_credentials());
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    let role: UserRole = user.role.into();
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, role.as_str(), user.team_id)?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user.id, role.as_str(), user.team_id)?;

    info!(user_id = %user.id, role = %role, "User logged in");

    Ok(ok(LoginResponse {
        user,
        access_token,
        refresh_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /auth/refresh
///
/// Role and team are re-read from the database, so changes take effect on
/// the next refresh.
async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> ApiResult {
    let claims = state
        .jwt_service
        .validate_kind(&payload.refresh_token, TokenKind::Refresh)?;

    let user = UserRepository::new(state.db())
        .find_by_id(claims.user_id())
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::unauthorized("User no longer active"))?;

    let role: UserRole = user.role.into();
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, role.as_str(), user.team_id)?;

    info!(user_id = %user.id, "Access token refreshed");

    Ok(ok(RefreshResponse {
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// GET /auth/me
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult {
    let user = UserRepository::new(state.db()).get(auth.user_id()).await?;
    Ok(ok(user))
}
