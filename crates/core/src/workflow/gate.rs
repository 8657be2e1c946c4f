//! Posting gate: preconditions for `POSTED` and `CONFIRMED`.
//!
//! Every check runs; all failing reasons are returned together.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fiscal::PeriodState;
use crate::workflow::document::Document;
use crate::workflow::types::MatchStatus;

/// Why a document cannot be posted or confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "code", content = "status")]
pub enum BlockReason {
    /// The document type requires three-way match but lacks PO or receipt links.
    MatchReferencesMissing,
    /// Three-way match has not reached `MATCHED`.
    MatchIncomplete(MatchStatus),
    /// No period covers the document date.
    PeriodNotFound,
    /// The covering period is closed.
    PeriodClosed,
    /// The covering period is on hold.
    PeriodOnHold,
    /// The document is already posted.
    AlreadyPosted,
}

impl BlockReason {
    /// Stable reason code for remediation lists.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MatchReferencesMissing => "MatchReferencesMissing",
            Self::MatchIncomplete(_) => "MatchIncomplete",
            Self::PeriodNotFound => "PeriodNotFound",
            Self::PeriodClosed => "PeriodClosed",
            Self::PeriodOnHold => "PeriodOnHold",
            Self::AlreadyPosted => "AlreadyPosted",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchReferencesMissing => {
                write!(f, "purchase order and goods receipt must be linked")
            }
            Self::MatchIncomplete(status) => {
                write!(f, "three-way match is {status}, expected MATCHED")
            }
            Self::PeriodNotFound => write!(f, "no fiscal period covers the document date"),
            Self::PeriodClosed => write!(f, "fiscal period is closed"),
            Self::PeriodOnHold => write!(f, "fiscal period is on hold"),
            Self::AlreadyPosted => write!(f, "document is already posted"),
        }
    }
}

/// Outcome of the posting gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateResult {
    /// All checks passed.
    Clear,
    /// At least one check failed.
    Blocked(Vec<BlockReason>),
}

impl GateResult {
    /// Returns true if every check passed.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    /// The failing reasons, empty when clear.
    #[must_use]
    pub fn reasons(&self) -> &[BlockReason] {
        match self {
            Self::Clear => &[],
            Self::Blocked(reasons) => reasons,
        }
    }

    /// The reason codes, in check order.
    #[must_use]
    pub fn codes(&self) -> Vec<&'static str> {
        self.reasons().iter().map(BlockReason::code).collect()
    }
}

/// Read-only facts from other subsystems, looked up before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostingContext {
    /// State of the period covering the document date, if any.
    pub period_state: Option<PeriodState>,
    /// Match status for the linked PO and receipt, if linked.
    pub match_status: Option<MatchStatus>,
}

/// Stateless posting gate.
pub struct PostingGate;

impl PostingGate {
    /// Evaluates every posting precondition against `document`.
    ///
    /// Checks, independently:
    /// - three-way match is `MATCHED` (only for types that require it)
    /// - the covering period is open
    /// - the document is not already posted
    #[must_use]
    pub fn can_post(document: &Document, context: &PostingContext) -> GateResult {
        let mut reasons = Vec::new();

        if document.document_type.requires_three_way_match() {
            match (document.match_refs(), context.match_status) {
                (None, _) => reasons.push(BlockReason::MatchReferencesMissing),
                (Some(_), Some(MatchStatus::Matched)) => {}
                (Some(_), status) => reasons.push(BlockReason::MatchIncomplete(
                    status.unwrap_or(MatchStatus::Pending),
                )),
            }
        }

        match context.period_state {
            Some(PeriodState::Open) => {}
            Some(PeriodState::Closed) => reasons.push(BlockReason::PeriodClosed),
            Some(PeriodState::Hold) => reasons.push(BlockReason::PeriodOnHold),
            None => reasons.push(BlockReason::PeriodNotFound),
        }

        if document.is_posted {
            reasons.push(BlockReason::AlreadyPosted);
        }

        if reasons.is_empty() {
            GateResult::Clear
        } else {
            GateResult::Blocked(reasons)
        }
    }
}
