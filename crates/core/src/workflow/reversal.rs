//! Reversal of posted documents.
//!
//! A posted document is never edited back. Reversal moves it to `REVERSED`
//! and produces a separate reversing document that is itself posted.

use chrono::Utc;
use docflow_shared::types::{DocumentId, UserId};

use crate::workflow::document::{Document, LifecycleEvent};
use crate::workflow::error::WorkflowError;
use crate::workflow::lifecycle::LifecycleService;
use crate::workflow::types::{ApprovalStatus, LifecycleState};

/// Stateless service for creating reversing documents.
pub struct ReversalService;

impl ReversalService {
    /// Reverses a posted document.
    ///
    /// The original moves `POSTED → REVERSED` and links to the new document.
    /// The reversing document copies type, date and match links, negates the
    /// amount, and starts out posted.
    ///
    /// # Returns
    /// * `Ok(Document)` - the reversing document
    /// * `Err(WorkflowError::ReversalReasonRequired)` if reason is empty
    /// * `Err(WorkflowError::InvalidTransition)` if the original is not posted
    pub fn reverse(
        original: &mut Document,
        reversed_by: UserId,
        reason: &str,
    ) -> Result<Document, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::ReversalReasonRequired);
        }
        LifecycleService::check(original, LifecycleState::Reversed)?;

        let reversing = Self::reversing_document(original, reversed_by, reason);
        LifecycleService::transition(
            original,
            LifecycleState::Reversed,
            reversed_by,
            Some(reason.to_string()),
        )?;
        original.reversed_by = Some(reversing.id);

        Ok(reversing)
    }

    fn reversing_document(original: &Document, reversed_by: UserId, reason: &str) -> Document {
        let now = Utc::now();
        Document {
            id: DocumentId::new(),
            document_type: original.document_type,
            number: format!("REV-{}", original.number),
            document_date: original.document_date,
            amount: original.amount.map(|amount| -amount),
            state: LifecycleState::Posted,
            approval_instance_id: None,
            approval_status: Some(ApprovalStatus::Approved),
            is_posted: true,
            purchase_order_ref: original.purchase_order_ref,
            goods_receipt_ref: original.goods_receipt_ref,
            match_status: original.match_status,
            reverses: Some(original.id),
            reversed_by: None,
            created_by: reversed_by,
            created_at: now,
            updated_at: now,
            version: 0,
            history: vec![LifecycleEvent {
                from: LifecycleState::Draft,
                to: LifecycleState::Posted,
                actor: reversed_by,
                at: now,
                note: Some(format!(
                    "Reversal of document {}. Reason: {reason}",
                    original.number
                )),
            }],
        }
    }
}
