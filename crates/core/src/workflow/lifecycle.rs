//! Document lifecycle state machine.
//!
//! Enforces only the shape of the transition graph. Gating (period state,
//! three-way match) belongs to the posting gate.

use chrono::Utc;
use docflow_shared::types::UserId;

use crate::workflow::document::{Document, LifecycleEvent};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{DocumentType, LifecycleState, PostingKind};

/// Stateless service for document lifecycle transitions.
pub struct LifecycleService;

impl LifecycleService {
    /// Check if a transition is legal for a document type.
    ///
    /// Valid transitions:
    /// - Draft → PendingApproval
    /// - PendingApproval → Approved | Rejected
    /// - Rejected → PendingApproval
    /// - Approved → Confirmed (PO-like) | Posted (invoice-like)
    /// - Confirmed | PartiallyReceived → PartiallyReceived | Received | Cancelled
    ///   (receipt states only for documents that track receipts)
    /// - Posted → Reversed
    #[must_use]
    pub fn is_valid_transition(
        document_type: DocumentType,
        from: LifecycleState,
        to: LifecycleState,
    ) -> bool {
        use LifecycleState::{
            Approved, Cancelled, Confirmed, Draft, PartiallyReceived, PendingApproval, Posted,
            Received, Rejected, Reversed,
        };

        match (from, to) {
            (Draft | Rejected, PendingApproval)
            | (PendingApproval, Approved | Rejected)
            | (Posted, Reversed) => true,
            (Approved, Posted) => document_type.posting_kind() == PostingKind::Post,
            (Approved, Confirmed) => document_type.posting_kind() == PostingKind::Confirm,
            (Confirmed, Cancelled) => true,
            (Confirmed | PartiallyReceived, PartiallyReceived | Received)
            | (PartiallyReceived, Cancelled) => document_type.tracks_receipts(),
            _ => false,
        }
    }

    /// Legal targets from `from` for a document type.
    #[must_use]
    pub fn allowed_targets(
        document_type: DocumentType,
        from: LifecycleState,
    ) -> Vec<LifecycleState> {
        ALL_STATES
            .into_iter()
            .filter(|&to| Self::is_valid_transition(document_type, from, to))
            .collect()
    }

    /// Validates a transition without applying it.
    pub fn check(document: &Document, to: LifecycleState) -> Result<(), WorkflowError> {
        if Self::is_valid_transition(document.document_type, document.state, to) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: document.state,
                to,
            })
        }
    }

    /// Applies a transition to a document and records it in its history.
    ///
    /// # Returns
    /// * `Ok(LifecycleEvent)` describing the applied change
    /// * `Err(WorkflowError::InvalidTransition)` if the edge is not in the graph
    pub fn transition(
        document: &mut Document,
        to: LifecycleState,
        actor: UserId,
        note: Option<String>,
    ) -> Result<LifecycleEvent, WorkflowError> {
        Self::check(document, to)?;

        let now = Utc::now();
        let event = LifecycleEvent {
            from: document.state,
            to,
            actor,
            at: now,
            note,
        };

        document.state = to;
        if to == LifecycleState::Posted {
            document.is_posted = true;
        }
        document.updated_at = now;
        document.history.push(event.clone());
        Ok(event)
    }
}

/// Every lifecycle state, in graph order.
pub const ALL_STATES: [LifecycleState; 10] = [
    LifecycleState::Draft,
    LifecycleState::PendingApproval,
    LifecycleState::Approved,
    LifecycleState::Rejected,
    LifecycleState::Confirmed,
    LifecycleState::PartiallyReceived,
    LifecycleState::Received,
    LifecycleState::Posted,
    LifecycleState::Reversed,
    LifecycleState::Cancelled,
];
