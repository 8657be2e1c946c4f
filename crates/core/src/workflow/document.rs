//! Document abstraction over invoices, orders, receipts and requisitions.

use chrono::{DateTime, NaiveDate, Utc};
use docflow_shared::types::{ApprovalInstanceId, DocumentId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::workflow::types::{ApprovalStatus, DocumentType, LifecycleState, MatchStatus};

/// One applied lifecycle change, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// State before the change.
    pub from: LifecycleState,
    /// State after the change.
    pub to: LifecycleState,
    /// Who caused the change.
    pub actor: UserId,
    /// When the change was applied.
    pub at: DateTime<Utc>,
    /// Optional note (rejection comment, reversal reason, ...).
    pub note: Option<String>,
}

/// Input for creating a draft document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Kind of document.
    pub document_type: DocumentType,
    /// Human-facing document number.
    pub number: String,
    /// Document date; selects the covering fiscal period.
    pub document_date: NaiveDate,
    /// Total amount, computed by the owning subsystem.
    pub amount: Option<Decimal>,
    /// Purchase order this document matches against.
    pub purchase_order_ref: Option<DocumentId>,
    /// Goods receipt this document matches against.
    pub goods_receipt_ref: Option<DocumentId>,
}

impl NewDocument {
    /// Creates input for a document without amount or match references.
    #[must_use]
    pub fn new(
        document_type: DocumentType,
        number: impl Into<String>,
        document_date: NaiveDate,
    ) -> Self {
        Self {
            document_type,
            number: number.into(),
            document_date,
            amount: None,
            purchase_order_ref: None,
            goods_receipt_ref: None,
        }
    }

    /// Sets the document amount.
    #[must_use]
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Links the document to a purchase order and goods receipt.
    #[must_use]
    pub fn with_match_refs(mut self, purchase_order: DocumentId, goods_receipt: DocumentId) -> Self {
        self.purchase_order_ref = Some(purchase_order);
        self.goods_receipt_ref = Some(goods_receipt);
        self
    }
}

/// A business document governed by the engine.
///
/// `state` only changes through lifecycle transitions. `approval_status`
/// mirrors the current approval instance, which stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Kind of document.
    pub document_type: DocumentType,
    /// Human-facing document number.
    pub number: String,
    /// Document date.
    pub document_date: NaiveDate,
    /// Total amount.
    pub amount: Option<Decimal>,
    /// Authoritative lifecycle state.
    pub state: LifecycleState,
    /// Most recent approval instance, if ever submitted.
    pub approval_instance_id: Option<ApprovalInstanceId>,
    /// Projection of the most recent instance's overall status.
    pub approval_status: Option<ApprovalStatus>,
    /// Set once the document has been posted.
    pub is_posted: bool,
    /// Linked purchase order.
    pub purchase_order_ref: Option<DocumentId>,
    /// Linked goods receipt.
    pub goods_receipt_ref: Option<DocumentId>,
    /// Last match status observed by the posting gate.
    pub match_status: Option<MatchStatus>,
    /// Original document, when this is a reversing document.
    pub reverses: Option<DocumentId>,
    /// Reversing document, once this document is reversed.
    pub reversed_by: Option<DocumentId>,
    /// Creator.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-lock version, bumped by the store on every write.
    pub version: u64,
    /// Applied lifecycle changes, oldest first.
    pub history: Vec<LifecycleEvent>,
}

impl Document {
    /// Creates a draft document.
    #[must_use]
    pub fn draft(input: NewDocument, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            document_type: input.document_type,
            number: input.number,
            document_date: input.document_date,
            amount: input.amount,
            state: LifecycleState::Draft,
            approval_instance_id: None,
            approval_status: None,
            is_posted: false,
            purchase_order_ref: input.purchase_order_ref,
            goods_receipt_ref: input.goods_receipt_ref,
            match_status: None,
            reverses: None,
            reversed_by: None,
            created_by,
            created_at: now,
            updated_at: now,
            version: 0,
            history: Vec::new(),
        }
    }

    /// Returns the (purchase order, goods receipt) pair when both are linked.
    #[must_use]
    pub fn match_refs(&self) -> Option<(DocumentId, DocumentId)> {
        self.purchase_order_ref.zip(self.goods_receipt_ref)
    }

    /// Returns true if the document may be hard-deleted.
    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.state == LifecycleState::Draft && self.approval_instance_id.is_none()
    }
}
