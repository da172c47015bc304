//! Workflow error types.

use thiserror::Error;

use affdesk_shared::AppError;

/// Errors that can occur during status workflows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        /// Record kind, e.g. `salary`.
        entity: &'static str,
        /// The current status.
        from: &'static str,
        /// The attempted target status.
        to: &'static str,
    },

    /// The record can no longer be edited or deleted in its current status.
    #[error("Cannot modify {entity} in status {status}")]
    NotModifiable {
        /// Record kind.
        entity: &'static str,
        /// The current status.
        status: &'static str,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,
}

impl WorkflowError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotModifiable { .. } => "NOT_MODIFIABLE",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::RejectionReasonRequired => Self::field("reason", err.to_string()),
            _ => Self::BusinessRule(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = WorkflowError::InvalidTransition {
            entity: "salary",
            from: "paid",
            to: "approved",
        };
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(
            err.to_string(),
            "Invalid salary status transition from paid to approved"
        );

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 400);
    }

    #[test]
    fn test_reason_required_is_field_error() {
        let app: AppError = WorkflowError::RejectionReasonRequired.into();
        match app {
            AppError::InvalidInput(fields) => assert_eq!(fields[0].field, "reason"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
