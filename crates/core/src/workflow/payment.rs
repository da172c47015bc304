//! Partner payment lifecycle.
//!
//! ```text
//! pending    → processing | hold | cancelled
//! processing → completed | failed | hold | cancelled
//! hold       → processing | cancelled
//! failed     → processing | cancelled
//! ```
//!
//! Completed and cancelled are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkflowError;

/// Partner payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created, not yet sent.
    Pending,
    /// Being processed by the partner or the bank.
    Processing,
    /// Paused pending clarification.
    Hold,
    /// Settled.
    Completed,
    /// Failed; may be retried.
    Failed,
    /// Withdrawn.
    Cancelled,
}

impl PaymentStatus {
    /// Every status.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Processing,
        Self::Hold,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Hold => "hold",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Statuses reachable in one step.
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processing, Self::Hold, Self::Cancelled],
            Self::Processing => &[Self::Completed, Self::Failed, Self::Hold, Self::Cancelled],
            Self::Hold => &[Self::Processing, Self::Cancelled],
            Self::Failed => &[Self::Processing, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    /// Returns true if `self → next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    /// Details (amount, references) may be edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::Hold)
    }

    /// The record may be deleted.
    #[must_use]
    pub const fn is_deletable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stateless payment transition checks.
pub struct PaymentWorkflow;

impl PaymentWorkflow {
    /// Validates `current → next` and returns `next`.
    pub fn transition(
        current: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<PaymentStatus, WorkflowError> {
        if current.can_transition_to(next) {
            Ok(next)
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: "payment",
                from: current.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Guard for edits.
    pub fn ensure_editable(current: PaymentStatus) -> Result<(), WorkflowError> {
        if current.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotModifiable {
                entity: "payment",
                status: current.as_str(),
            })
        }
    }

    /// Guard for deletes.
    pub fn ensure_deletable(current: PaymentStatus) -> Result<(), WorkflowError> {
        if current.is_deletable() {
            Ok(())
        } else {
            Err(WorkflowError::NotModifiable {
                entity: "payment",
                status: current.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(PaymentStatus::Pending, PaymentStatus::Processing)]
    #[case(PaymentStatus::Pending, PaymentStatus::Hold)]
    #[case(PaymentStatus::Processing, PaymentStatus::Completed)]
    #[case(PaymentStatus::Processing, PaymentStatus::Failed)]
    #[case(PaymentStatus::Hold, PaymentStatus::Processing)]
    #[case(PaymentStatus::Failed, PaymentStatus::Processing)]
    #[case(PaymentStatus::Failed, PaymentStatus::Cancelled)]
    fn test_allowed(#[case] from: PaymentStatus, #[case] to: PaymentStatus) {
        assert_eq!(PaymentWorkflow::transition(from, to), Ok(to));
    }

    #[rstest]
    #[case(PaymentStatus::Pending, PaymentStatus::Completed)]
    #[case(PaymentStatus::Hold, PaymentStatus::Completed)]
    #[case(PaymentStatus::Completed, PaymentStatus::Processing)]
    #[case(PaymentStatus::Cancelled, PaymentStatus::Pending)]
    #[case(PaymentStatus::Processing, PaymentStatus::Pending)]
    fn test_rejected(#[case] from: PaymentStatus, #[case] to: PaymentStatus) {
        assert!(matches!(
            PaymentWorkflow::transition(from, to),
            Err(WorkflowError::InvalidTransition { entity: "payment", .. })
        ));
    }

    #[test]
    fn test_edit_and_delete_guards() {
        assert!(PaymentWorkflow::ensure_editable(PaymentStatus::Hold).is_ok());
        assert!(PaymentWorkflow::ensure_editable(PaymentStatus::Processing).is_err());
        assert!(PaymentWorkflow::ensure_deletable(PaymentStatus::Pending).is_ok());
        assert!(PaymentWorkflow::ensure_deletable(PaymentStatus::Hold).is_err());
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(PaymentStatus::parse("Hold"), Some(PaymentStatus::Hold));
        assert_eq!(PaymentStatus::parse("paid"), None);
    }
}
