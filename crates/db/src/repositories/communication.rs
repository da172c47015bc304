//! Communication repository: threaded messages attached to flows and bizdev
//! requests.
//!
//! `context_id` has no foreign key because it points into one of two tables;
//! existence is checked here and owners delete their messages when they go.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use affdesk_core::auth::Actor;
use affdesk_core::communication::{
    CommunicationRules, MAX_REPLY_DEPTH, ThreadError, ThreadMessage,
};
use affdesk_shared::AppError;

use super::db_error;
use crate::entities::{
    bizdev_requests, communications, flows, sea_orm_active_enums::ContextType, users,
};

/// Error types for communication operations.
#[derive(Debug, thiserror::Error)]
pub enum CommunicationError {
    /// Message not found.
    #[error("Message not found: {0}")]
    NotFound(Uuid),

    /// The flow or bizdev request does not exist.
    #[error("{context} not found: {id}")]
    ContextNotFound {
        /// Context kind.
        context: &'static str,
        /// Context id.
        id: Uuid,
    },

    /// Parent message does not exist.
    #[error("Parent message does not exist: {0}")]
    ParentNotFound(Uuid),

    /// Message rule violated.
    #[error(transparent)]
    Thread(#[from] ThreadError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CommunicationError> for AppError {
    fn from(err: CommunicationError) -> Self {
        match err {
            CommunicationError::NotFound(_) | CommunicationError::ContextNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            CommunicationError::ParentNotFound(_) => Self::field("parent_id", err.to_string()),
            CommunicationError::Thread(e) => e.into(),
            CommunicationError::Database(e) => db_error(e),
        }
    }
}

/// Input for posting a message.
#[derive(Debug, Clone)]
pub struct CreateMessageInput {
    /// Context kind.
    pub context_type: ContextType,
    /// Flow or bizdev request id.
    pub context_id: Uuid,
    /// Message replied to.
    pub parent_id: Option<Uuid>,
    /// Author.
    pub author_id: Uuid,
    /// Raw body; trimmed before storage.
    pub message: String,
}

#[derive(Debug, FromQueryResult)]
struct MessageRow {
    id: Uuid,
    parent_id: Option<Uuid>,
    author_id: Uuid,
    author_name: String,
    message: String,
    is_edited: bool,
    created_at: DateTimeWithTimeZone,
    updated_at: DateTimeWithTimeZone,
}

impl From<MessageRow> for ThreadMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            author_id: row.author_id,
            author_name: row.author_name,
            message: row.message,
            is_edited: row.is_edited,
            created_at: row.created_at.with_timezone(&Utc),
            updated_at: row.updated_at.with_timezone(&Utc),
        }
    }
}

/// Communication repository.
#[derive(Debug, Clone)]
pub struct CommunicationRepository {
    db: DatabaseConnection,
}

impl CommunicationRepository {
    /// Creates a new communication repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fails with `ContextNotFound` unless the context object exists.
    pub async fn ensure_context(
        &self,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<(), CommunicationError> {
        let exists = match context_type {
            ContextType::Flow => flows::Entity::find_by_id(context_id)
                .one(&self.db)
                .await?
                .is_some(),
            ContextType::BizdevRequest => bizdev_requests::Entity::find_by_id(context_id)
                .one(&self.db)
                .await?
                .is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(CommunicationError::ContextNotFound {
                context: match context_type {
                    ContextType::Flow => "Flow",
                    ContextType::BizdevRequest => "Bizdev request",
                },
                id: context_id,
            })
        }
    }

    /// All messages of a context with author names, oldest first.
    pub async fn thread(
        &self,
        context_type: ContextType,
        context_id: Uuid,
    ) -> Result<Vec<ThreadMessage>, CommunicationError> {
        let rows = communications::Entity::find()
            .select_only()
            .columns([
                communications::Column::Id,
                communications::Column::ParentId,
                communications::Column::AuthorId,
                communications::Column::Message,
                communications::Column::IsEdited,
                communications::Column::CreatedAt,
                communications::Column::UpdatedAt,
            ])
            .column_as(users::Column::FullName, "author_name")
            .join(JoinType::InnerJoin, communications::Relation::Users.def())
            .filter(communications::Column::ContextType.eq(context_type))
            .filter(communications::Column::ContextId.eq(context_id))
            .order_by_asc(communications::Column::CreatedAt)
            .into_model::<MessageRow>()
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(ThreadMessage::from).collect())
    }

    /// Loads a message or fails with `CommunicationError::NotFound`.
    pub async fn get(&self, id: Uuid) -> Result<communications::Model, CommunicationError> {
        communications::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CommunicationError::NotFound(id))
    }

    /// Posts a message, optionally as a reply within the same context.
    pub async fn create(
        &self,
        input: CreateMessageInput,
    ) -> Result<communications::Model, CommunicationError> {
        let message = CommunicationRules::normalize_message(&input.message)?;
        self.ensure_context(input.context_type, input.context_id)
            .await?;

        if let Some(parent_id) = input.parent_id {
            let parent = communications::Entity::find_by_id(parent_id)
                .one(&self.db)
                .await?
                .ok_or(CommunicationError::ParentNotFound(parent_id))?;
            CommunicationRules::check_parent(
                (input.context_type.into(), input.context_id),
                (parent.context_type.into(), parent.context_id),
            )?;
            let depth = self.depth_below(parent.parent_id).await?;
            CommunicationRules::check_reply_depth(depth)?;
        }

        let now = Utc::now().into();
        let row = communications::ActiveModel {
            id: Set(Uuid::new_v4()),
            context_type: Set(input.context_type),
            context_id: Set(input.context_id),
            parent_id: Set(input.parent_id),
            author_id: Set(input.author_id),
            message: Set(message),
            is_edited: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(row.insert(&self.db).await?)
    }

    /// Number of ancestors above a message whose parent is `parent_id`.
    ///
    /// Stops counting past `MAX_REPLY_DEPTH`.
    async fn depth_below(
        &self,
        mut parent_id: Option<Uuid>,
    ) -> Result<usize, CommunicationError> {
        let mut depth = 0;
        while let Some(id) = parent_id {
            depth += 1;
            if depth > MAX_REPLY_DEPTH {
                break;
            }
            parent_id = communications::Entity::find_by_id(id)
                .select_only()
                .column(communications::Column::ParentId)
                .into_tuple::<Option<Uuid>>()
                .one(&self.db)
                .await?
                .flatten();
        }
        Ok(depth)
    }

    /// Replaces the body of the actor's own message.
    pub async fn update_message(
        &self,
        id: Uuid,
        actor: &Actor,
        message: &str,
    ) -> Result<communications::Model, CommunicationError> {
        let existing = self.get(id).await?;
        CommunicationRules::ensure_can_edit(actor, existing.author_id)?;
        let message = CommunicationRules::normalize_message(message)?;

        let mut active: communications::ActiveModel = existing.into();
        active.message = Set(message);
        active.is_edited = Set(true);
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a message; replies go with it through the parent foreign key.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<(), CommunicationError> {
        let existing = self.get(id).await?;
        CommunicationRules::ensure_can_delete(actor, existing.author_id)?;
        communications::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
