//! Workflow domain types for document lifecycle and approval management.
//!
//! Every status in the engine is a closed enum; string forms exist only for
//! configuration and wire formats.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of business document governed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Accounts-payable vendor invoice.
    ApInvoice,
    /// Goods receipt note.
    GoodsReceipt,
    /// Purchase order.
    PurchaseOrder,
    /// Internal purchase requisition.
    PurchaseRequisition,
}

impl DocumentType {
    /// All document types, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::ApInvoice,
        Self::GoodsReceipt,
        Self::PurchaseOrder,
        Self::PurchaseRequisition,
    ];

    /// Returns the string representation of the document type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApInvoice => "AP_INVOICE",
            Self::GoodsReceipt => "GOODS_RECEIPT",
            Self::PurchaseOrder => "PURCHASE_ORDER",
            Self::PurchaseRequisition => "PURCHASE_REQUISITION",
        }
    }

    /// Parses a document type from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AP_INVOICE" => Some(Self::ApInvoice),
            "GOODS_RECEIPT" => Some(Self::GoodsReceipt),
            "PURCHASE_ORDER" => Some(Self::PurchaseOrder),
            "PURCHASE_REQUISITION" => Some(Self::PurchaseRequisition),
            _ => None,
        }
    }

    /// How an approved document of this type is finalized.
    #[must_use]
    pub fn posting_kind(&self) -> PostingKind {
        match self {
            Self::ApInvoice | Self::GoodsReceipt => PostingKind::Post,
            Self::PurchaseOrder | Self::PurchaseRequisition => PostingKind::Confirm,
        }
    }

    /// Returns true if posting requires a completed three-way match.
    #[must_use]
    pub fn requires_three_way_match(&self) -> bool {
        matches!(self, Self::ApInvoice)
    }

    /// Returns true if confirmed documents of this type track goods receipts.
    #[must_use]
    pub fn tracks_receipts(&self) -> bool {
        matches!(self, Self::PurchaseOrder)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finalizing transition available to an approved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostingKind {
    /// Invoice-like: `APPROVED → POSTED`.
    Post,
    /// PO-like: `APPROVED → CONFIRMED`.
    Confirm,
}

impl PostingKind {
    /// The lifecycle state reached by this finalizing transition.
    #[must_use]
    pub fn target_state(&self) -> LifecycleState {
        match self {
            Self::Post => LifecycleState::Posted,
            Self::Confirm => LifecycleState::Confirmed,
        }
    }
}

/// Authoritative lifecycle state of a document.
///
/// Legal transitions:
/// - Draft → PendingApproval (submit)
/// - PendingApproval → Approved | Rejected (approval outcome)
/// - Rejected → PendingApproval (resubmit)
/// - Approved → Confirmed (PO-like) | Posted (invoice-like)
/// - Confirmed → PartiallyReceived | Received | Cancelled
/// - Posted → Reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// Being drafted; may be edited or hard-deleted.
    Draft,
    /// Submitted; an approval instance is open.
    PendingApproval,
    /// All approval steps approved.
    Approved,
    /// Some approval step rejected; may be resubmitted.
    Rejected,
    /// Confirmed with the supplier (PO-like documents).
    Confirmed,
    /// Some goods received against the confirmed document.
    PartiallyReceived,
    /// All goods received.
    Received,
    /// Recognized in the general ledger (immutable).
    Posted,
    /// Offset by a separate reversing document (terminal).
    Reversed,
    /// Cancelled (terminal).
    Cancelled,
}

impl LifecycleState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Confirmed => "CONFIRMED",
            Self::PartiallyReceived => "PARTIALLY_RECEIVED",
            Self::Received => "RECEIVED",
            Self::Posted => "POSTED",
            Self::Reversed => "REVERSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a state from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(Self::Draft),
            "PENDING_APPROVAL" => Some(Self::PendingApproval),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "CONFIRMED" => Some(Self::Confirmed),
            "PARTIALLY_RECEIVED" => Some(Self::PartiallyReceived),
            "RECEIVED" => Some(Self::Received),
            "POSTED" => Some(Self::Posted),
            "REVERSED" => Some(Self::Reversed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if no transition leaves this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reversed | Self::Cancelled | Self::Received)
    }

    /// Returns true if this state is only reachable through submit/decide.
    #[must_use]
    pub fn is_approval_driven(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::PendingApproval | Self::Approved | Self::Rejected
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall status of an approval instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// At least one step is still undecided.
    Pending,
    /// Every step approved.
    Approved,
    /// A step was rejected.
    Rejected,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns true once the instance can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The document lifecycle state implied by a terminal status.
    #[must_use]
    pub fn lifecycle_state(&self) -> LifecycleState {
        match self {
            Self::Pending => LifecycleState::PendingApproval,
            Self::Approved => LifecycleState::Approved,
            Self::Rejected => LifecycleState::Rejected,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single step instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Not yet decided.
    Pending,
    /// Approved by its approver.
    Approved,
    /// Rejected by its approver.
    Rejected,
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns true once the step carries a decision.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision recorded against the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Approve and advance.
    Approve,
    /// Reject and halt the chain.
    Reject,
}

impl Decision {
    /// The step status this decision produces.
    #[must_use]
    pub fn step_status(&self) -> StepStatus {
        match self {
            Self::Approve => StepStatus::Approved,
            Self::Reject => StepStatus::Rejected,
        }
    }
}

/// Three-way match status reported by the match service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Matching has not run yet.
    Pending,
    /// Some lines match, others do not.
    PartiallyMatched,
    /// Quantities or amounts disagree.
    Mismatched,
    /// Purchase order, goods receipt and invoice agree.
    Matched,
}

impl MatchStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PartiallyMatched => "PARTIALLY_MATCHED",
            Self::Mismatched => "MISMATCHED",
            Self::Matched => "MATCHED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
