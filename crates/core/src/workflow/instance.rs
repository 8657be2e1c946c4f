//! Approval instances and their ordered step instances.
//!
//! An instance snapshots its workflow definition at submission time; later
//! registry changes never reach instances already in flight.

use chrono::{DateTime, Utc};
use docflow_shared::types::{ApprovalInstanceId, DocumentId, UserId, WorkflowDefinitionId};
use serde::{Deserialize, Serialize};

use crate::workflow::aggregate::{ApprovalSummary, StatusAggregator};
use crate::workflow::approval::UserRole;
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::document::Document;
use crate::workflow::error::WorkflowError;
use crate::workflow::lifecycle::LifecycleService;
use crate::workflow::types::{ApprovalStatus, DocumentType, LifecycleState, StepStatus};

/// One step of one approval instance.
///
/// Decided at most once and never reopened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStepInstance {
    /// Owning instance.
    pub approval_instance_id: ApprovalInstanceId,
    /// 1-based position within the instance.
    pub sequence: u32,
    /// Step name copied from the template.
    pub name: String,
    /// Step description copied from the template.
    pub description: Option<String>,
    /// Role requirement copied from the template.
    pub approver_role: Option<UserRole>,
    /// Decision status.
    pub status: StepStatus,
    /// When the step became actionable; `None` while blocked by a predecessor.
    pub activated_at: Option<DateTime<Utc>>,
    /// Who decided the step.
    pub decided_by: Option<UserId>,
    /// Decision comment or rejection reason.
    pub comment: Option<String>,
    /// When the step was decided.
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalStepInstance {
    /// Returns true if the step is pending and activated.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.status == StepStatus::Pending && self.activated_at.is_some()
    }
}

/// One submission of one document against a workflow definition.
///
/// While `status` is `Pending`, exactly one step is actionable: every
/// earlier step is approved and every later step is pending and blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalInstance {
    /// Unique identifier.
    pub id: ApprovalInstanceId,
    /// Document under approval.
    pub document_id: DocumentId,
    /// Type of that document.
    pub document_type: DocumentType,
    /// Definition the steps were snapshotted from.
    pub definition_id: WorkflowDefinitionId,
    /// Definition name at snapshot time.
    pub definition_name: String,
    /// Overall status, derived from the steps.
    pub status: ApprovalStatus,
    /// Step instances ordered by sequence.
    pub steps: Vec<ApprovalStepInstance>,
    /// Who submitted the document.
    pub submitted_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When step 1 was activated.
    pub activated_at: DateTime<Utc>,
    /// When the instance reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Optimistic-lock version, bumped by the store on every write.
    pub version: u64,
}

impl ApprovalInstance {
    /// The current actionable step, if the instance is still pending.
    #[must_use]
    pub fn current_step(&self) -> Option<&ApprovalStepInstance> {
        if self.status != ApprovalStatus::Pending {
            return None;
        }
        self.steps.iter().find(|s| s.status == StepStatus::Pending)
    }

    /// Sequence of the current actionable step.
    #[must_use]
    pub fn current_sequence(&self) -> Option<u32> {
        self.current_step().map(|s| s.sequence)
    }

    /// Looks up a step by sequence.
    #[must_use]
    pub fn step(&self, sequence: u32) -> Option<&ApprovalStepInstance> {
        self.steps.iter().find(|s| s.sequence == sequence)
    }

    /// Returns true once the instance is approved or rejected.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress summary for reporting.
    #[must_use]
    pub fn summary(&self) -> ApprovalSummary {
        StatusAggregator::aggregate(self)
    }
}

/// Stateless service creating approval instances.
pub struct InstanceService;

impl InstanceService {
    /// Checks that a document may be submitted.
    ///
    /// The document must be `DRAFT` or `REJECTED`, and any previous instance
    /// must be terminal. `previous` must be the instance the document points
    /// at, when it points at one.
    pub fn check_submittable(
        document: &Document,
        previous: Option<&ApprovalInstance>,
    ) -> Result<(), WorkflowError> {
        let invalid = || WorkflowError::InvalidTransition {
            from: document.state,
            to: LifecycleState::PendingApproval,
        };

        if !matches!(
            document.state,
            LifecycleState::Draft | LifecycleState::Rejected
        ) {
            return Err(invalid());
        }

        match (document.approval_instance_id, previous) {
            (None, _) => Ok(()),
            (Some(id), Some(prev)) if prev.id == id => {
                if prev.is_terminal() {
                    Ok(())
                } else {
                    Err(invalid())
                }
            }
            (Some(id), _) => Err(WorkflowError::InstanceNotFound(id)),
        }
    }

    /// Snapshots `definition` into a fresh instance with step 1 activated.
    #[must_use]
    pub fn instantiate(
        definition: &WorkflowDefinition,
        document: &Document,
        submitted_by: UserId,
    ) -> ApprovalInstance {
        let now = Utc::now();
        let id = ApprovalInstanceId::new();

        let steps = definition
            .steps
            .iter()
            .enumerate()
            .map(|(index, template)| ApprovalStepInstance {
                approval_instance_id: id,
                sequence: template.sequence,
                name: template.name.clone(),
                description: template.description.clone(),
                approver_role: template.approver_role,
                status: StepStatus::Pending,
                activated_at: (index == 0).then_some(now),
                decided_by: None,
                comment: None,
                decided_at: None,
            })
            .collect();

        ApprovalInstance {
            id,
            document_id: document.id,
            document_type: document.document_type,
            definition_id: definition.id,
            definition_name: definition.name.clone(),
            status: ApprovalStatus::Pending,
            steps,
            submitted_by,
            created_at: now,
            activated_at: now,
            completed_at: None,
            version: 0,
        }
    }

    /// Submits a document: creates the instance and moves the document to
    /// `PENDING_APPROVAL`.
    ///
    /// # Returns
    /// * `Ok(ApprovalInstance)` with step 1 activated
    /// * `Err(WorkflowError::InvalidTransition)` if the document cannot be submitted
    pub fn submit(
        document: &mut Document,
        previous: Option<&ApprovalInstance>,
        definition: &WorkflowDefinition,
        submitted_by: UserId,
    ) -> Result<ApprovalInstance, WorkflowError> {
        Self::check_submittable(document, previous)?;

        let instance = Self::instantiate(definition, document, submitted_by);
        LifecycleService::transition(
            document,
            LifecycleState::PendingApproval,
            submitted_by,
            None,
        )?;
        document.approval_instance_id = Some(instance.id);
        document.approval_status = Some(instance.status);

        Ok(instance)
    }
}
