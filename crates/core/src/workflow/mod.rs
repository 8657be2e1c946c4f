//! Document approval workflow and lifecycle engine.
//!
//! # Modules
//!
//! - `types` - Document types, lifecycle states, approval and match statuses
//! - `error` - Workflow error taxonomy
//! - `definition` - Workflow definitions and the registry
//! - `instance` - Approval instances and submission
//! - `executor` - Step decisions
//! - `approval` - Roles and approval limits
//! - `lifecycle` - Lifecycle state machine
//! - `gate` - Posting gate
//! - `aggregate` - Status aggregation for reporting
//! - `reversal` - Reversing documents
//! - `store` - Collaborator traits and change sets
//! - `memory` - In-memory collaborators
//! - `engine` - The operations callers invoke

pub mod aggregate;
pub mod approval;
pub mod definition;
pub mod document;
pub mod engine;
pub mod error;
pub mod executor;
pub mod gate;
pub mod instance;
pub mod lifecycle;
pub mod memory;
pub mod reversal;
pub mod store;
pub mod types;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod definition_props;
#[cfg(test)]
mod executor_props;
#[cfg(test)]
mod gate_props;
#[cfg(test)]
mod lifecycle_props;

pub use aggregate::{ApprovalSummary, StatusAggregator};
pub use approval::{Actor, ApprovalEngine, DEFAULT_APPROVER_ROLE, UserRole};
pub use definition::{WorkflowDefinition, WorkflowRegistry, WorkflowStepTemplate};
pub use document::{Document, LifecycleEvent, NewDocument};
pub use engine::{DecisionOutcome, SubmitOutcome, TransitionOutcome, WorkflowEngine};
pub use error::WorkflowError;
pub use executor::StepService;
pub use gate::{BlockReason, GateResult, PostingContext, PostingGate};
pub use instance::{ApprovalInstance, ApprovalStepInstance, InstanceService};
pub use lifecycle::LifecycleService;
pub use memory::{InMemoryDocumentStore, InMemoryMatchService, InMemoryPeriodService};
pub use reversal::ReversalService;
pub use store::{
    ChangeSet, Committed, DocumentStore, InstanceChange, InstanceFilter, MatchService,
    PeriodService, StoreError,
};
pub use types::{
    ApprovalStatus, Decision, DocumentType, LifecycleState, MatchStatus, PostingKind, StepStatus,
};
