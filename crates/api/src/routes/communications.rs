//! Communication routes: threaded messages on flows and bizdev requests.

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use affdesk_core::communication::{ContextType, build_thread};
use affdesk_db::CommunicationRepository;
use affdesk_db::repositories::CreateMessageInput;
use affdesk_shared::AppError;

use super::visible_flow;
use crate::AppState;
use crate::extractors::{PathParams, ValidatedJson};
use crate::middleware::AuthUser;
use crate::response::{ApiError, ApiResult, created, message, ok};

/// Creates the communication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/communications/{context_type}/{context_id}",
            get(get_thread).post(post_message),
        )
        .route(
            "/communications/{id}",
            patch(edit_message).delete(delete_message),
        )
}

/// Request body for posting a message.
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    /// Body; trimmed, at most `MAX_MESSAGE_CHARS` characters.
    pub message: String,
    /// Message replied to.
    pub parent_id: Option<Uuid>,
}

/// Request body for editing a message.
#[derive(Debug, Deserialize, Validate)]
pub struct EditMessageRequest {
    /// New body.
    pub message: String,
}

fn parse_context(raw: &str) -> Result<ContextType, ApiError> {
    ContextType::parse(raw).ok_or_else(|| {
        ApiError(AppError::field(
            "context_type",
            format!("unknown context type '{raw}'"),
        ))
    })
}

/// Checks that the context exists and that the caller may read it.
async fn open_context(
    state: &AppState,
    auth: &AuthUser,
    context_type: ContextType,
    context_id: Uuid,
) -> ApiResult<()> {
    match context_type {
        ContextType::Flow => {
            visible_flow(state, auth, context_id).await?;
        }
        ContextType::BizdevRequest => {
            CommunicationRepository::new(state.db())
                .ensure_context(context_type.into(), context_id)
                .await?;
        }
    }
    Ok(())
}

/// GET /communications/{context_type}/{context_id}
async fn get_thread(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((raw_type, context_id)): PathParams<(String, Uuid)>,
) -> ApiResult {
    let context_type = parse_context(&raw_type)?;
    open_context(&state, &auth, context_type, context_id).await?;

    let messages = CommunicationRepository::new(state.db())
        .thread(context_type.into(), context_id)
        .await?;
    Ok(ok(build_thread(messages)))
}

/// POST /communications/{context_type}/{context_id}
async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams((raw_type, context_id)): PathParams<(String, Uuid)>,
    ValidatedJson(payload): ValidatedJson<PostMessageRequest>,
) -> ApiResult {
    let context_type = parse_context(&raw_type)?;
    open_context(&state, &auth, context_type, context_id).await?;

    let input = CreateMessageInput {
        context_type: context_type.into(),
        context_id,
        parent_id: payload.parent_id,
        author_id: auth.user_id(),
        message: payload.message,
    };
    let saved = CommunicationRepository::new(state.db()).create(input).await?;

    info!(
        message_id = %saved.id,
        context = %context_type,
        context_id = %context_id,
        author_id = %auth.user_id(),
        "Message posted"
    );
    Ok(created(saved))
}

/// PATCH /communications/{id}
async fn edit_message(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(payload): ValidatedJson<EditMessageRequest>,
) -> ApiResult {
    let saved = CommunicationRepository::new(state.db())
        .update_message(id, &auth.actor(), &payload.message)
        .await?;

    info!(message_id = %saved.id, "Message edited");
    Ok(ok(saved))
}

/// DELETE /communications/{id}
///
/// Replies go with the message.
async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult {
    CommunicationRepository::new(state.db())
        .delete(id, &auth.actor())
        .await?;

    info!(message_id = %id, deleted_by = %auth.user_id(), "Message deleted");
    Ok(message("Message deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context_accepts_path_forms() {
        assert_eq!(parse_context("flow").unwrap(), ContextType::Flow);
        assert_eq!(
            parse_context("bizdev-requests").unwrap(),
            ContextType::BizdevRequest
        );
        let err = parse_context("team").unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }
}
