//! Workflow error types for approval and lifecycle management.
//!
//! A blocked posting is not an error: the posting gate reports it as a
//! structured `GateResult` so every failing reason reaches the caller.

use docflow_shared::AppError;
use docflow_shared::types::{ApprovalInstanceId, DocumentId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::types::{DocumentType, LifecycleState};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),

    /// Approval instance not found.
    #[error("Approval instance {0} not found")]
    InstanceNotFound(ApprovalInstanceId),

    /// No workflow definition is registered for the document type.
    #[error("No workflow definition registered for document type {0}")]
    DefinitionNotFound(DocumentType),

    /// The instance has no step with the requested sequence.
    #[error("Approval instance {instance_id} has no step {sequence}")]
    StepNotFound {
        /// The instance that was addressed.
        instance_id: ApprovalInstanceId,
        /// The requested step sequence.
        sequence: u32,
    },

    /// Malformed workflow configuration.
    #[error("Invalid workflow definition for {document_type}: {reason}")]
    InvalidDefinition {
        /// The document type as written in configuration.
        document_type: String,
        /// What is wrong with the definition.
        reason: String,
    },

    /// Attempted a transition outside the lifecycle graph.
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        /// The current state.
        from: LifecycleState,
        /// The attempted target state.
        to: LifecycleState,
    },

    /// Decision attempted on a step that is not the current actionable step.
    #[error("Step {requested} is not actionable (current step: {current})")]
    StepNotActionable {
        /// The step the caller tried to decide.
        requested: u32,
        /// The current actionable step.
        current: u32,
    },

    /// The step or the whole instance already carries a decision.
    #[error("Approval instance {instance_id} step {sequence} is already decided")]
    AlreadyDecided {
        /// The instance that was addressed.
        instance_id: ApprovalInstanceId,
        /// The requested step sequence.
        sequence: u32,
    },

    /// Optimistic-lock conflict; re-read and retry.
    #[error("Concurrent modification detected for document {0}, please retry")]
    ConcurrentModification(DocumentId),

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Reversal reason is required but not provided.
    #[error("Reversal reason is required")]
    ReversalReasonRequired,

    /// Actor role is below the step's required role.
    #[error("User role {user_role} does not meet required role {required_role}")]
    InsufficientRole {
        /// The actor's role.
        user_role: String,
        /// The role the step requires.
        required_role: String,
    },

    /// Document amount exceeds the actor's approval limit.
    #[error("Document amount {amount} exceeds user approval limit {limit}")]
    ExceedsApprovalLimit {
        /// The document amount.
        amount: Decimal,
        /// The actor's approval limit.
        limit: Decimal,
    },

    /// Only never-submitted drafts may be hard-deleted.
    #[error("Document {id} in state {state} cannot be deleted")]
    DocumentNotDeletable {
        /// The document.
        id: DocumentId,
        /// Its current state.
        state: LifecycleState,
    },

    /// Collaborator (store, period or match service) failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::StepNotActionable { .. }
            | Self::RejectionReasonRequired
            | Self::ReversalReasonRequired => 400,

            Self::InsufficientRole { .. } | Self::ExceedsApprovalLimit { .. } => 403,

            Self::DocumentNotFound(_)
            | Self::InstanceNotFound(_)
            | Self::DefinitionNotFound(_)
            | Self::StepNotFound { .. } => 404,

            Self::AlreadyDecided { .. } | Self::ConcurrentModification(_) => 409,

            Self::DocumentNotDeletable { .. } => 422,

            Self::InvalidDefinition { .. } | Self::Store(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::InstanceNotFound(_) => "INSTANCE_NOT_FOUND",
            Self::DefinitionNotFound(_) => "DEFINITION_NOT_FOUND",
            Self::StepNotFound { .. } => "STEP_NOT_FOUND",
            Self::InvalidDefinition { .. } => "INVALID_DEFINITION",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::StepNotActionable { .. } => "STEP_NOT_ACTIONABLE",
            Self::AlreadyDecided { .. } => "ALREADY_DECIDED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::ReversalReasonRequired => "REVERSAL_REASON_REQUIRED",
            Self::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            Self::ExceedsApprovalLimit { .. } => "EXCEEDS_APPROVAL_LIMIT",
            Self::DocumentNotDeletable { .. } => "DOCUMENT_NOT_DELETABLE",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true for the not-found family.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::DocumentNotFound(_)
            | WorkflowError::InstanceNotFound(_)
            | WorkflowError::DefinitionNotFound(_)
            | WorkflowError::StepNotFound { .. } => Self::NotFound(message),
            WorkflowError::InvalidDefinition { .. } => Self::Configuration(message),
            WorkflowError::RejectionReasonRequired | WorkflowError::ReversalReasonRequired => {
                Self::Validation(message)
            }
            WorkflowError::InsufficientRole { .. } | WorkflowError::ExceedsApprovalLimit { .. } => {
                Self::Forbidden(message)
            }
            WorkflowError::AlreadyDecided { .. } | WorkflowError::ConcurrentModification(_) => {
                Self::Conflict(message)
            }
            WorkflowError::InvalidTransition { .. }
            | WorkflowError::StepNotActionable { .. }
            | WorkflowError::DocumentNotDeletable { .. } => Self::BusinessRule(message),
            WorkflowError::Store(_) => Self::Storage(message),
        }
    }
}
