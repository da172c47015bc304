//! Property-based tests for the salary and payment workflows.

use proptest::prelude::*;
use uuid::Uuid;

use super::{PaymentStatus, PaymentWorkflow, SalaryStatus, SalaryWorkflow, WorkflowError};

fn arb_salary_status() -> impl Strategy<Value = SalaryStatus> {
    prop::sample::select(SalaryStatus::ALL.to_vec())
}

fn arb_payment_status() -> impl Strategy<Value = PaymentStatus> {
    prop::sample::select(PaymentStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Terminal salary statuses accept no action at all.
    #[test]
    fn prop_salary_terminal_is_final(reviewer in any::<u128>().prop_map(Uuid::from_u128)) {
        for status in [SalaryStatus::Paid, SalaryStatus::Rejected] {
            prop_assert!(SalaryWorkflow::approve(status, reviewer).is_err());
            prop_assert!(SalaryWorkflow::reject(status, reviewer, "late").is_err());
            prop_assert!(SalaryWorkflow::pay(status).is_err());
        }
    }

    /// A successful salary action always lands on a status the table allows.
    #[test]
    fn prop_salary_actions_follow_table(status in arb_salary_status()) {
        let attempts = [
            SalaryWorkflow::approve(status, Uuid::nil()),
            SalaryWorkflow::reject(status, Uuid::nil(), "reason"),
            SalaryWorkflow::pay(status),
        ];
        for action in attempts.into_iter().flatten() {
            prop_assert!(status.can_transition_to(action.new_status()));
        }
    }

    /// Payment transitions succeed exactly when the table allows them.
    #[test]
    fn prop_payment_transition_matches_table(
        from in arb_payment_status(),
        to in arb_payment_status(),
    ) {
        let result = PaymentWorkflow::transition(from, to);
        if from.can_transition_to(to) {
            prop_assert_eq!(result, Ok(to));
        } else {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
        }
    }

    /// No status transitions to itself.
    #[test]
    fn prop_no_self_loops(status in arb_payment_status()) {
        prop_assert!(!status.can_transition_to(status));
    }
}
