//! Property-based tests for StepService.

use chrono::NaiveDate;
use docflow_shared::types::UserId;
use proptest::prelude::*;

use crate::workflow::approval::{Actor, UserRole};
use crate::workflow::definition::{WorkflowDefinition, WorkflowStepTemplate};
use crate::workflow::document::{Document, NewDocument};
use crate::workflow::error::WorkflowError;
use crate::workflow::executor::StepService;
use crate::workflow::instance::{ApprovalInstance, InstanceService};
use crate::workflow::types::{ApprovalStatus, Decision, DocumentType, LifecycleState, StepStatus};

fn submitted(steps: u32) -> (ApprovalInstance, Document) {
    let definition = WorkflowDefinition::new(
        DocumentType::PurchaseRequisition,
        "Requisition approval",
        (1..=steps)
            .map(|n| WorkflowStepTemplate::new(n, format!("Step {n}")))
            .collect(),
    );
    let mut document = Document::draft(
        NewDocument::new(
            DocumentType::PurchaseRequisition,
            "PR-1",
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        ),
        UserId::new(),
    );
    let instance = InstanceService::submit(&mut document, None, &definition, UserId::new()).unwrap();
    (instance, document)
}

fn actionable_count(instance: &ApprovalInstance) -> usize {
    instance.steps.iter().filter(|s| s.is_actionable()).count()
}

/// A step count and a 1-based step within it.
fn arb_steps_and_position() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=8).prop_flat_map(|n| (Just(n), 1..=n))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // At most one actionable step, decided in increasing order
    // =========================================================================

    #[test]
    fn prop_single_actionable_step((steps, stop) in arb_steps_and_position()) {
        let (mut instance, mut document) = submitted(steps);
        let actor = Actor::new(UserId::new(), UserRole::Approver);

        for sequence in 1..=stop {
            prop_assert_eq!(actionable_count(&instance), 1);
            prop_assert_eq!(instance.current_sequence(), Some(sequence));
            StepService::decide(&mut instance, &mut document, sequence, Decision::Approve, &actor, None)
                .unwrap();
        }

        if stop == steps {
            prop_assert_eq!(actionable_count(&instance), 0);
            prop_assert_eq!(instance.status, ApprovalStatus::Approved);
            prop_assert_eq!(document.state, LifecycleState::Approved);
        } else {
            prop_assert_eq!(actionable_count(&instance), 1);
            prop_assert_eq!(document.state, LifecycleState::PendingApproval);
        }
    }

    // =========================================================================
    // Rejecting step k of n halts the chain; k+1..n stay undecided forever
    // =========================================================================

    #[test]
    fn prop_rejection_halts_chain((steps, reject_at) in arb_steps_and_position()) {
        let (mut instance, mut document) = submitted(steps);
        let actor = Actor::new(UserId::new(), UserRole::Admin);

        for sequence in 1..reject_at {
            StepService::decide(&mut instance, &mut document, sequence, Decision::Approve, &actor, None)
                .unwrap();
        }
        StepService::decide(
            &mut instance,
            &mut document,
            reject_at,
            Decision::Reject,
            &actor,
            Some("out of budget".to_string()),
        )
        .unwrap();

        prop_assert_eq!(instance.status, ApprovalStatus::Rejected);
        prop_assert_eq!(document.state, LifecycleState::Rejected);

        for later in (reject_at + 1)..=steps {
            let result = StepService::decide(
                &mut instance,
                &mut document,
                later,
                Decision::Approve,
                &actor,
                None,
            );
            let already_decided = matches!(result, Err(WorkflowError::AlreadyDecided { .. }));
            prop_assert!(already_decided);
        }
        for step in instance.steps.iter().filter(|s| s.sequence > reject_at) {
            prop_assert_eq!(step.status, StepStatus::Pending);
            prop_assert!(step.decided_by.is_none());
        }
    }

    // =========================================================================
    // Out-of-order decisions fail and change nothing
    // =========================================================================

    #[test]
    fn prop_out_of_order_rejected(
        (steps, target) in arb_steps_and_position(),
        decision in prop_oneof![Just(Decision::Approve), Just(Decision::Reject)]
    ) {
        prop_assume!(target > 1);
        let (mut instance, mut document) = submitted(steps);
        let before = (instance.clone(), document.clone());
        let actor = Actor::new(UserId::new(), UserRole::Owner);

        let result = StepService::decide(
            &mut instance,
            &mut document,
            target,
            decision,
            &actor,
            Some("note".to_string()),
        );
        let not_actionable = matches!(
            result,
            Err(WorkflowError::StepNotActionable { current: 1, .. })
        );
        prop_assert!(not_actionable);
        prop_assert_eq!((instance, document), before);
    }
}
