//! Salary lifecycle.
//!
//! Valid transitions:
//! - Pending → Approved (approve)
//! - Pending → Rejected (reject)
//! - Approved → Rejected (reject)
//! - Approved → Paid (pay)
//!
//! Paid and Rejected are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::WorkflowError;

/// Salary status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryStatus {
    /// Created, awaiting review; the only editable status.
    Pending,
    /// Approved for payout.
    Approved,
    /// Rejected with a reason.
    Rejected,
    /// Paid out.
    Paid,
}

impl SalaryStatus {
    /// Every status.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Paid];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true if `self → next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Rejected | Self::Paid)
        )
    }

    /// Returns true if no transition leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Paid)
    }

    /// Returns true if amounts may still be edited or the record deleted.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for SalaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated salary transition with audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalaryAction {
    /// Approved by a reviewer.
    Approve {
        /// Who approved.
        reviewed_by: Uuid,
        /// When.
        reviewed_at: DateTime<Utc>,
    },
    /// Rejected by a reviewer.
    Reject {
        /// Who rejected.
        reviewed_by: Uuid,
        /// When.
        reviewed_at: DateTime<Utc>,
        /// Why; stored as the salary comment.
        reason: String,
    },
    /// Paid out.
    Pay {
        /// When.
        paid_at: DateTime<Utc>,
    },
}

impl SalaryAction {
    /// The status the salary moves to.
    #[must_use]
    pub const fn new_status(&self) -> SalaryStatus {
        match self {
            Self::Approve { .. } => SalaryStatus::Approved,
            Self::Reject { .. } => SalaryStatus::Rejected,
            Self::Pay { .. } => SalaryStatus::Paid,
        }
    }
}

/// Stateless salary transition checks.
pub struct SalaryWorkflow;

impl SalaryWorkflow {
    fn check(current: SalaryStatus, next: SalaryStatus) -> Result<(), WorkflowError> {
        if current.can_transition_to(next) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                entity: "salary",
                from: current.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// Approve a pending salary.
    pub fn approve(
        current: SalaryStatus,
        reviewed_by: Uuid,
    ) -> Result<SalaryAction, WorkflowError> {
        Self::check(current, SalaryStatus::Approved)?;
        Ok(SalaryAction::Approve {
            reviewed_by,
            reviewed_at: Utc::now(),
        })
    }

    /// Reject a pending or approved salary. The reason must not be blank.
    pub fn reject(
        current: SalaryStatus,
        reviewed_by: Uuid,
        reason: &str,
    ) -> Result<SalaryAction, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::RejectionReasonRequired);
        }
        Self::check(current, SalaryStatus::Rejected)?;
        Ok(SalaryAction::Reject {
            reviewed_by,
            reviewed_at: Utc::now(),
            reason: reason.to_string(),
        })
    }

    /// Mark an approved salary as paid.
    pub fn pay(current: SalaryStatus) -> Result<SalaryAction, WorkflowError> {
        Self::check(current, SalaryStatus::Paid)?;
        Ok(SalaryAction::Pay {
            paid_at: Utc::now(),
        })
    }

    /// Guard for edits and deletes.
    pub fn ensure_editable(current: SalaryStatus) -> Result<(), WorkflowError> {
        if current.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotModifiable {
                entity: "salary",
                status: current.as_str(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let reviewer = Uuid::new_v4();
        let approved = SalaryWorkflow::approve(SalaryStatus::Pending, reviewer).unwrap();
        assert_eq!(approved.new_status(), SalaryStatus::Approved);

        let paid = SalaryWorkflow::pay(approved.new_status()).unwrap();
        assert_eq!(paid.new_status(), SalaryStatus::Paid);
    }

    #[test]
    fn test_reject_from_approved() {
        let action =
            SalaryWorkflow::reject(SalaryStatus::Approved, Uuid::nil(), "  duplicate  ").unwrap();
        match action {
            SalaryAction::Reject { reason, .. } => assert_eq!(reason, "duplicate"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reject_needs_reason() {
        assert_eq!(
            SalaryWorkflow::reject(SalaryStatus::Pending, Uuid::nil(), "   "),
            Err(WorkflowError::RejectionReasonRequired)
        );
    }

    #[test]
    fn test_pay_requires_approval() {
        assert_eq!(
            SalaryWorkflow::pay(SalaryStatus::Pending),
            Err(WorkflowError::InvalidTransition {
                entity: "salary",
                from: "pending",
                to: "paid",
            })
        );
    }

    #[test]
    fn test_only_pending_is_editable() {
        assert!(SalaryWorkflow::ensure_editable(SalaryStatus::Pending).is_ok());
        for status in [SalaryStatus::Approved, SalaryStatus::Rejected, SalaryStatus::Paid] {
            assert!(SalaryWorkflow::ensure_editable(status).is_err());
        }
    }

    #[test]
    fn test_parse() {
        for status in SalaryStatus::ALL {
            assert_eq!(SalaryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SalaryStatus::parse("void"), None);
    }
}
