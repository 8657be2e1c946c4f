//! Workflow engine: the operations callers invoke.
//!
//! Every mutating operation reads one document (and its current instance),
//! validates against the pure services, then writes everything through a
//! single version-checked commit. A lost race surfaces as
//! `ConcurrentModification` and nothing is written.

use std::sync::Arc;

use docflow_shared::types::{ApprovalInstanceId, DocumentId, PageRequest, PageResponse, UserId};
use tracing::{info, warn};

use crate::workflow::aggregate::{ApprovalSummary, StatusAggregator};
use crate::workflow::approval::Actor;
use crate::workflow::definition::WorkflowRegistry;
use crate::workflow::document::{Document, NewDocument};
use crate::workflow::error::WorkflowError;
use crate::workflow::executor::StepService;
use crate::workflow::gate::{BlockReason, GateResult, PostingContext, PostingGate};
use crate::workflow::instance::{ApprovalInstance, ApprovalStepInstance, InstanceService};
use crate::workflow::lifecycle::LifecycleService;
use crate::workflow::reversal::ReversalService;
use crate::workflow::store::{
    ChangeSet, Committed, DocumentStore, InstanceChange, InstanceFilter, MatchService,
    PeriodService, StoreError,
};
use crate::workflow::types::{ApprovalStatus, Decision, LifecycleState, StepStatus};

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The new approval instance.
    pub instance: ApprovalInstance,
    /// Sequence of the step that is now actionable.
    pub activated_step: u32,
    /// The document, now `PENDING_APPROVAL`.
    pub document: Document,
}

/// Result of a recorded decision.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// The decided step.
    pub step: ApprovalStepInstance,
    /// The instance after the decision.
    pub instance: ApprovalInstance,
    /// The document after the decision.
    pub document: Document,
}

impl DecisionOutcome {
    /// Status of the decided step.
    #[must_use]
    pub fn step_status(&self) -> StepStatus {
        self.step.status
    }

    /// Overall status of the instance.
    #[must_use]
    pub fn instance_status(&self) -> ApprovalStatus {
        self.instance.status
    }

    /// Lifecycle state of the document.
    #[must_use]
    pub fn document_state(&self) -> LifecycleState {
        self.document.state
    }
}

/// Result of a lifecycle transition request.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The transition was committed.
    Applied {
        /// The document after the transition.
        document: Document,
        /// The reversing document, for `REVERSED`.
        reversing_document: Option<Document>,
    },
    /// The posting gate refused; nothing was written.
    Blocked(Vec<BlockReason>),
}

impl TransitionOutcome {
    /// Returns true if the transition was committed.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// The committed document, if applied.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Applied { document, .. } => Some(document),
            Self::Blocked(_) => None,
        }
    }

    /// The blocking reasons, empty if applied.
    #[must_use]
    pub fn reasons(&self) -> &[BlockReason] {
        match self {
            Self::Applied { .. } => &[],
            Self::Blocked(reasons) => reasons,
        }
    }
}

/// Approval workflow and document lifecycle engine.
///
/// Holds no per-document state of its own; everything flows through the
/// collaborators, so one engine can be shared across tasks.
pub struct WorkflowEngine<S, P, M> {
    registry: Arc<WorkflowRegistry>,
    store: S,
    periods: P,
    matches: M,
}

impl<S, P, M> WorkflowEngine<S, P, M>
where
    S: DocumentStore,
    P: PeriodService,
    M: MatchService,
{
    /// Creates an engine over a loaded registry and its collaborators.
    pub fn new(registry: Arc<WorkflowRegistry>, store: S, periods: P, matches: M) -> Self {
        Self {
            registry,
            store,
            periods,
            matches,
        }
    }

    /// The workflow registry.
    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    /// The document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The period service.
    pub fn periods(&self) -> &P {
        &self.periods
    }

    /// The match service.
    pub fn matches(&self) -> &M {
        &self.matches
    }

    /// Creates a `DRAFT` document.
    pub async fn create_document(
        &self,
        input: NewDocument,
        created_by: UserId,
    ) -> Result<Document, WorkflowError> {
        let document = self
            .store
            .insert_document(Document::draft(input, created_by))
            .await?;
        info!(
            document_id = %document.id,
            document_type = %document.document_type,
            number = %document.number,
            actor = %created_by,
            "Created document"
        );
        Ok(document)
    }

    /// Reads a document.
    pub async fn get_document(&self, id: DocumentId) -> Result<Document, WorkflowError> {
        self.store
            .get_document(id)
            .await?
            .ok_or(WorkflowError::DocumentNotFound(id))
    }

    /// Hard-deletes a draft that was never submitted.
    pub async fn delete_draft(&self, id: DocumentId) -> Result<(), WorkflowError> {
        let document = self.get_document(id).await?;
        if !document.is_deletable() {
            return Err(WorkflowError::DocumentNotDeletable {
                id,
                state: document.state,
            });
        }
        self.store
            .delete_document(id, document.version)
            .await
            .map_err(|err| Self::conflict_logged(err, "delete_draft"))?;
        info!(document_id = %id, "Deleted draft document");
        Ok(())
    }

    /// Submits a document for approval.
    ///
    /// Snapshots the registered definition into a new instance with step 1
    /// activated and moves the document to `PENDING_APPROVAL`, in one commit.
    ///
    /// # Returns
    /// * `Err(WorkflowError::InvalidTransition)` if the document is not
    ///   `DRAFT`/`REJECTED` or its current instance is still open
    /// * `Err(WorkflowError::DefinitionNotFound)` if no workflow is registered
    /// * `Err(WorkflowError::ConcurrentModification)` if the document changed
    ///   since it was read
    pub async fn submit(
        &self,
        document_id: DocumentId,
        submitted_by: UserId,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let mut document = self.get_document(document_id).await?;
        let previous = match document.approval_instance_id {
            Some(id) => self.store.get_instance(id).await?,
            None => None,
        };
        InstanceService::check_submittable(&document, previous.as_ref())?;

        let definition = self.registry.get_definition(document.document_type)?;
        let instance =
            InstanceService::submit(&mut document, previous.as_ref(), &definition, submitted_by)?;

        let committed = self
            .commit(
                ChangeSet::document(document).with_instance(InstanceChange::Insert(instance)),
                "submit",
            )
            .await?;
        let (document, instance) = Self::with_instance(committed, document_id)?;
        let activated_step = instance.current_sequence().unwrap_or(1);

        info!(
            document_id = %document.id,
            instance_id = %instance.id,
            definition = %instance.definition_name,
            steps = instance.steps.len(),
            actor = %submitted_by,
            "Submitted document for approval"
        );
        Ok(SubmitOutcome {
            instance,
            activated_step,
            document,
        })
    }

    /// Records a decision on the current step of an instance.
    ///
    /// # Returns
    /// * `Err(WorkflowError::StepNotActionable)` for an out-of-order step
    /// * `Err(WorkflowError::AlreadyDecided)` if the step or instance is decided
    /// * `Err(WorkflowError::ConcurrentModification)` if another decision won
    pub async fn decide(
        &self,
        instance_id: ApprovalInstanceId,
        sequence: u32,
        decision: Decision,
        actor: &Actor,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let mut instance = self.get_instance(instance_id).await?;
        let mut document = self.get_document(instance.document_id).await?;
        let document_id = document.id;

        let step = StepService::decide(
            &mut instance,
            &mut document,
            sequence,
            decision,
            actor,
            comment,
        )?;

        let committed = self
            .commit(
                ChangeSet::document(document).with_instance(InstanceChange::Update(instance)),
                "decide",
            )
            .await?;
        let (document, instance) = Self::with_instance(committed, document_id)?;

        info!(
            document_id = %document.id,
            instance_id = %instance.id,
            step = sequence,
            decision = ?decision,
            instance_status = %instance.status,
            document_state = %document.state,
            actor = %actor.id,
            "Recorded approval decision"
        );
        Ok(DecisionOutcome {
            step,
            instance,
            document,
        })
    }

    /// Moves a document along its post-approval lifecycle.
    ///
    /// Used for confirm, post, receive, cancel and reverse. Approval-driven
    /// states are only reachable through `submit` and `decide`. Posting and
    /// confirming consult the posting gate first; a blocked gate writes
    /// nothing. `note` is the reversal reason for `REVERSED`.
    pub async fn transition(
        &self,
        document_id: DocumentId,
        target: LifecycleState,
        actor: UserId,
        note: Option<String>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let mut document = self.get_document(document_id).await?;
        let from = document.state;

        if target.is_approval_driven() {
            return Err(WorkflowError::InvalidTransition { from, to: target });
        }
        LifecycleService::check(&document, target)?;

        if target == LifecycleState::Reversed {
            let reason = note.unwrap_or_default();
            let reversing = ReversalService::reverse(&mut document, actor, &reason)?;
            let committed = self
                .commit(
                    ChangeSet::document(document).with_created(reversing),
                    "reverse",
                )
                .await?;
            let reversing_document = committed.created.into_iter().next();
            info!(
                document_id = %document_id,
                reversing_document_id = ?reversing_document.as_ref().map(|d| d.id),
                actor = %actor,
                reason = %reason.trim(),
                "Reversed document"
            );
            return Ok(TransitionOutcome::Applied {
                document: committed.document,
                reversing_document,
            });
        }

        let mut period_hold: Option<P::Hold> = None;
        if target == document.document_type.posting_kind().target_state() {
            let (context, hold) = self.posting_context(&document).await?;
            if let GateResult::Blocked(reasons) = PostingGate::can_post(&document, &context) {
                let codes: Vec<_> = reasons.iter().map(BlockReason::code).collect();
                warn!(
                    document_id = %document_id,
                    from = %from,
                    to = %target,
                    reasons = ?codes,
                    "Transition blocked by posting gate"
                );
                return Ok(TransitionOutcome::Blocked(reasons));
            }
            if context.match_status.is_some() {
                document.match_status = context.match_status;
            }
            period_hold = Some(hold);
        }

        LifecycleService::transition(&mut document, target, actor, note)?;
        let committed = self
            .commit(ChangeSet::document(document), "transition")
            .await?;
        // Period state may change again once the posting is visible
        drop(period_hold);

        info!(
            document_id = %document_id,
            from = %from,
            to = %target,
            actor = %actor,
            "Applied lifecycle transition"
        );
        Ok(TransitionOutcome::Applied {
            document: committed.document,
            reversing_document: None,
        })
    }

    /// Reverses a posted document, returning the original and the reversing
    /// document.
    pub async fn reverse(
        &self,
        document_id: DocumentId,
        actor: UserId,
        reason: impl Into<String>,
    ) -> Result<(Document, Document), WorkflowError> {
        match self
            .transition(
                document_id,
                LifecycleState::Reversed,
                actor,
                Some(reason.into()),
            )
            .await?
        {
            TransitionOutcome::Applied {
                document,
                reversing_document: Some(reversing),
            } => Ok((document, reversing)),
            _ => Err(WorkflowError::Store(
                "reversal committed without a reversing document".to_string(),
            )),
        }
    }

    /// Evaluates the posting gate for a document without changing it.
    pub async fn check_posting(&self, document_id: DocumentId) -> Result<GateResult, WorkflowError> {
        let document = self.get_document(document_id).await?;
        let (context, _) = self.posting_context(&document).await?;
        Ok(PostingGate::can_post(&document, &context))
    }

    /// Reads an approval instance.
    pub async fn get_instance(
        &self,
        id: ApprovalInstanceId,
    ) -> Result<ApprovalInstance, WorkflowError> {
        self.store
            .get_instance(id)
            .await?
            .ok_or(WorkflowError::InstanceNotFound(id))
    }

    /// Lists instances passing `filter`, one page at a time.
    pub async fn list_instances(
        &self,
        filter: &InstanceFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ApprovalInstance>, WorkflowError> {
        let instances = self.store.list_instances(filter).await?;
        Ok(page.paginate(instances))
    }

    /// Progress summaries for every instance passing `filter`, grouped by
    /// instance id.
    pub async fn summarize(
        &self,
        filter: &InstanceFilter,
    ) -> Result<Vec<ApprovalSummary>, WorkflowError> {
        let steps: Vec<ApprovalStepInstance> = self
            .store
            .list_instances(filter)
            .await?
            .into_iter()
            .flat_map(|instance| instance.steps)
            .collect();
        Ok(StatusAggregator::group(&steps))
    }

    async fn posting_context(
        &self,
        document: &Document,
    ) -> Result<(PostingContext, P::Hold), WorkflowError> {
        let (period_state, hold) = self.periods.hold_period(document.document_date).await?;
        let match_status = match document.match_refs() {
            Some((purchase_order, goods_receipt)) => Some(
                self.matches
                    .get_match_status(purchase_order, goods_receipt)
                    .await?,
            ),
            None => None,
        };
        Ok((
            PostingContext {
                period_state,
                match_status,
            },
            hold,
        ))
    }

    async fn commit(
        &self,
        changes: ChangeSet,
        operation: &'static str,
    ) -> Result<Committed, WorkflowError> {
        self.store
            .commit(changes)
            .await
            .map_err(|err| Self::conflict_logged(err, operation))
    }

    fn conflict_logged(err: StoreError, operation: &'static str) -> WorkflowError {
        if let StoreError::Conflict(document_id) = &err {
            warn!(%document_id, operation, "Optimistic lock conflict");
        }
        err.into()
    }

    fn with_instance(
        committed: Committed,
        document_id: DocumentId,
    ) -> Result<(Document, ApprovalInstance), WorkflowError> {
        let Committed {
            document, instance, ..
        } = committed;
        instance
            .map(|instance| (document, instance))
            .ok_or_else(|| {
                WorkflowError::Store(format!(
                    "commit for document {document_id} returned no instance"
                ))
            })
    }
}
