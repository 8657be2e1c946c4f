//! Property-based tests for ApprovalEngine.

use docflow_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::workflow::approval::{Actor, ApprovalEngine, UserRole};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::Decision;

fn arb_role() -> impl Strategy<Value = UserRole> {
    prop_oneof![
        Just(UserRole::Viewer),
        Just(UserRole::Submitter),
        Just(UserRole::Approver),
        Just(UserRole::Accountant),
        Just(UserRole::Admin),
        Just(UserRole::Owner),
    ]
}

/// Amounts with two decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Role hierarchy: a step is decidable exactly by roles at or above it
    // =========================================================================

    #[test]
    fn prop_role_hierarchy(actor_role in arb_role(), required in arb_role()) {
        let actor = Actor::new(UserId::new(), actor_role);
        let result = ApprovalEngine::can_decide(&actor, Some(required), Decision::Reject, None);
        if actor_role >= required {
            prop_assert!(result.is_ok());
        } else {
            let insufficient = matches!(result, Err(WorkflowError::InsufficientRole { .. }));
            prop_assert!(insufficient);
        }
    }

    // =========================================================================
    // Approval limits bind approvers only, and only on approve
    // =========================================================================

    #[test]
    fn prop_limit_binds_approver_approvals(
        role in arb_role(),
        limit in arb_amount(),
        amount in arb_amount()
    ) {
        prop_assume!(role >= UserRole::Approver);
        let actor = Actor::new(UserId::new(), role).with_limit(limit);

        let approve = ApprovalEngine::can_decide(&actor, None, Decision::Approve, Some(amount));
        if role == UserRole::Approver && amount > limit {
            let exceeded = matches!(approve, Err(WorkflowError::ExceedsApprovalLimit { .. }));
            prop_assert!(exceeded);
        } else {
            prop_assert!(approve.is_ok());
        }

        let reject = ApprovalEngine::can_decide(&actor, None, Decision::Reject, Some(amount));
        prop_assert!(reject.is_ok());
    }
}
