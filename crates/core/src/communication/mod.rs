//! Threaded communications attached to business objects.

mod thread;

pub use thread::{MessageNode, ThreadMessage, build_thread};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use affdesk_shared::AppError;

use crate::auth::{Actor, UserRole};

/// Longest accepted message, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Deepest reply level; a root message sits at level 0.
pub const MAX_REPLY_DEPTH: usize = 32;

/// Kind of object a thread is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    /// A traffic flow.
    Flow,
    /// A bizdev request.
    BizdevRequest,
}

impl ContextType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::BizdevRequest => "bizdev_request",
        }
    }

    /// Parses a wire name; also accepts the hyphenated path form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flow" | "flows" => Some(Self::Flow),
            "bizdev_request" | "bizdev-request" | "bizdev-requests" => Some(Self::BizdevRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Communication rule violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThreadError {
    /// Blank message.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Message over the length limit.
    #[error("message must be at most {MAX_MESSAGE_CHARS} characters")]
    MessageTooLong,

    /// Reply to a message from another thread.
    #[error("parent message belongs to another context")]
    ParentInOtherContext,

    /// Reply below the deepest allowed level.
    #[error("replies can be nested at most {MAX_REPLY_DEPTH} levels deep")]
    TooDeep,

    /// Edit attempted by someone other than the author.
    #[error("only the author can edit a message")]
    NotAuthor,

    /// Delete attempted by someone who is neither author nor admin.
    #[error("only the author or an admin can delete a message")]
    CannotDelete,
}

impl From<ThreadError> for AppError {
    fn from(err: ThreadError) -> Self {
        match err {
            ThreadError::EmptyMessage | ThreadError::MessageTooLong => {
                Self::field("message", err.to_string())
            }
            ThreadError::ParentInOtherContext | ThreadError::TooDeep => {
                Self::field("parent_id", err.to_string())
            }
            ThreadError::NotAuthor | ThreadError::CannotDelete => Self::Forbidden(err.to_string()),
        }
    }
}

/// Stateless communication rules.
pub struct CommunicationRules;

impl CommunicationRules {
    /// Trims and length-checks a message body, returning the stored form.
    pub fn normalize_message(message: &str) -> Result<String, ThreadError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ThreadError::EmptyMessage);
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ThreadError::MessageTooLong);
        }
        Ok(trimmed.to_string())
    }

    /// A reply's parent must sit in the same thread.
    pub fn check_parent(
        context: (ContextType, Uuid),
        parent_context: (ContextType, Uuid),
    ) -> Result<(), ThreadError> {
        if context == parent_context {
            Ok(())
        } else {
            Err(ThreadError::ParentInOtherContext)
        }
    }

    /// A reply to a message at `parent_depth` must stay within [`MAX_REPLY_DEPTH`].
    pub const fn check_reply_depth(parent_depth: usize) -> Result<(), ThreadError> {
        if parent_depth < MAX_REPLY_DEPTH {
            Ok(())
        } else {
            Err(ThreadError::TooDeep)
        }
    }

    /// Only the author edits.
    pub fn ensure_can_edit(actor: &Actor, author_id: Uuid) -> Result<(), ThreadError> {
        if actor.user_id == author_id {
            Ok(())
        } else {
            Err(ThreadError::NotAuthor)
        }
    }

    /// The author or an admin deletes.
    pub fn ensure_can_delete(actor: &Actor, author_id: Uuid) -> Result<(), ThreadError> {
        if actor.user_id == author_id || actor.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ThreadError::CannotDelete)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_message() {
        assert_eq!(
            CommunicationRules::normalize_message("  hello \n"),
            Ok("hello".to_string())
        );
        assert_eq!(
            CommunicationRules::normalize_message(" \t "),
            Err(ThreadError::EmptyMessage)
        );

        let at_limit = "я".repeat(MAX_MESSAGE_CHARS);
        assert!(CommunicationRules::normalize_message(&at_limit).is_ok());
        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            CommunicationRules::normalize_message(&over),
            Err(ThreadError::MessageTooLong)
        );
    }

    #[test]
    fn test_parent_same_context() {
        let flow = Uuid::new_v4();
        assert!(
            CommunicationRules::check_parent((ContextType::Flow, flow), (ContextType::Flow, flow))
                .is_ok()
        );
        assert_eq!(
            CommunicationRules::check_parent(
                (ContextType::Flow, flow),
                (ContextType::BizdevRequest, flow)
            ),
            Err(ThreadError::ParentInOtherContext)
        );
    }

    #[test]
    fn test_reply_depth_limit() {
        assert!(CommunicationRules::check_reply_depth(0).is_ok());
        assert!(CommunicationRules::check_reply_depth(MAX_REPLY_DEPTH - 1).is_ok());
        assert_eq!(
            CommunicationRules::check_reply_depth(MAX_REPLY_DEPTH),
            Err(ThreadError::TooDeep)
        );

        let err: AppError = ThreadError::TooDeep.into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_edit_and_delete_rights() {
        let author = Uuid::new_v4();
        let me = Actor::new(author, UserRole::Buyer, None);
        let admin = Actor::new(Uuid::new_v4(), UserRole::Admin, None);
        let other = Actor::new(Uuid::new_v4(), UserRole::TeamLead, None);

        assert!(CommunicationRules::ensure_can_edit(&me, author).is_ok());
        assert_eq!(
            CommunicationRules::ensure_can_edit(&admin, author),
            Err(ThreadError::NotAuthor)
        );
        assert!(CommunicationRules::ensure_can_delete(&admin, author).is_ok());
        assert!(CommunicationRules::ensure_can_delete(&other, author).is_err());
    }

    #[test]
    fn test_context_parse() {
        assert_eq!(ContextType::parse("bizdev-request"), Some(ContextType::BizdevRequest));
        assert_eq!(ContextType::parse("flow"), Some(ContextType::Flow));
        assert_eq!(ContextType::parse("team"), None);
        assert_eq!(
            serde_json::to_string(&ContextType::BizdevRequest).unwrap(),
            "\"bizdev_request\""
        );
    }
}
