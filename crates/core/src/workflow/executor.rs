//! Step executor: records decisions and advances or halts an instance.

use chrono::Utc;

use crate::workflow::aggregate::StatusAggregator;
use crate::workflow::approval::{Actor, ApprovalEngine};
use crate::workflow::document::Document;
use crate::workflow::error::WorkflowError;
use crate::workflow::instance::{ApprovalInstance, ApprovalStepInstance};
use crate::workflow::lifecycle::LifecycleService;
use crate::workflow::types::{ApprovalStatus, Decision};

/// Stateless service for step decisions.
pub struct StepService;

impl StepService {
    /// Validates that `sequence` may be decided now.
    ///
    /// # Returns
    /// * `Err(WorkflowError::AlreadyDecided)` if the instance is terminal or the
    ///   step already carries a decision
    /// * `Err(WorkflowError::StepNotFound)` if the instance has no such step
    /// * `Err(WorkflowError::StepNotActionable)` if the step is not the current one
    pub fn check_actionable(
        instance: &ApprovalInstance,
        sequence: u32,
    ) -> Result<(), WorkflowError> {
        let already_decided = || WorkflowError::AlreadyDecided {
            instance_id: instance.id,
            sequence,
        };

        if instance.is_terminal() {
            return Err(already_decided());
        }

        let step = instance
            .step(sequence)
            .ok_or(WorkflowError::StepNotFound {
                instance_id: instance.id,
                sequence,
            })?;
        if step.status.is_decided() {
            return Err(already_decided());
        }

        match instance.current_step() {
            Some(current) if current.sequence == sequence && current.is_actionable() => Ok(()),
            Some(current) => Err(WorkflowError::StepNotActionable {
                requested: sequence,
                current: current.sequence,
            }),
            None => Err(already_decided()),
        }
    }

    /// Records a decision on the current step.
    ///
    /// Approving the last step approves the instance and the document.
    /// Rejecting any step rejects both immediately; later steps stay undecided.
    /// Otherwise the next step is activated.
    ///
    /// On error neither `instance` nor `document` is modified.
    pub fn decide(
        instance: &mut ApprovalInstance,
        document: &mut Document,
        sequence: u32,
        decision: Decision,
        actor: &Actor,
        comment: Option<String>,
    ) -> Result<ApprovalStepInstance, WorkflowError> {
        Self::check_actionable(instance, sequence)?;

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if decision == Decision::Reject && comment.is_none() {
            return Err(WorkflowError::RejectionReasonRequired);
        }

        let index = instance
            .steps
            .iter()
            .position(|s| s.sequence == sequence)
            .ok_or(WorkflowError::StepNotFound {
                instance_id: instance.id,
                sequence,
            })?;
        ApprovalEngine::can_decide(
            actor,
            instance.steps[index].approver_role,
            decision,
            document.amount,
        )?;

        // Work on copies so a failed lifecycle transition leaves both untouched
        let mut next_instance = instance.clone();
        let mut next_document = document.clone();
        let now = Utc::now();

        let step = &mut next_instance.steps[index];
        step.status = decision.step_status();
        step.decided_by = Some(actor.id);
        step.comment.clone_from(&comment);
        step.decided_at = Some(now);

        let overall =
            StatusAggregator::overall_status(next_instance.steps.iter().map(|s| s.status));
        next_instance.status = overall;

        if overall == ApprovalStatus::Pending {
            if let Some(next) = next_instance.steps.get_mut(index + 1) {
                next.activated_at = Some(now);
            }
        } else {
            next_instance.completed_at = Some(now);
            let note = if decision == Decision::Reject {
                comment
            } else {
                None
            };
            LifecycleService::transition(
                &mut next_document,
                overall.lifecycle_state(),
                actor.id,
                note,
            )?;
        }
        next_document.approval_status = Some(overall);

        let decided = next_instance.steps[index].clone();
        *instance = next_instance;
        *document = next_document;
        Ok(decided)
    }
}
