//! Property-based tests for PostingGate.

use chrono::NaiveDate;
use docflow_shared::types::{DocumentId, UserId};
use proptest::prelude::*;

use crate::fiscal::PeriodState;
use crate::workflow::document::{Document, NewDocument};
use crate::workflow::gate::{BlockReason, PostingContext, PostingGate};
use crate::workflow::types::{DocumentType, LifecycleState, MatchStatus};

fn arb_period() -> impl Strategy<Value = Option<PeriodState>> {
    prop_oneof![
        Just(None),
        Just(Some(PeriodState::Open)),
        Just(Some(PeriodState::Closed)),
        Just(Some(PeriodState::Hold)),
    ]
}

fn arb_match() -> impl Strategy<Value = Option<MatchStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(MatchStatus::Pending)),
        Just(Some(MatchStatus::PartiallyMatched)),
        Just(Some(MatchStatus::Mismatched)),
        Just(Some(MatchStatus::Matched)),
    ]
}

fn arb_document_type() -> impl Strategy<Value = DocumentType> {
    prop::sample::select(DocumentType::ALL.to_vec())
}

fn approved(document_type: DocumentType, linked: bool, is_posted: bool) -> Document {
    let mut input = NewDocument::new(
        document_type,
        "DOC-G",
        NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
    );
    if linked {
        input = input.with_match_refs(DocumentId::new(), DocumentId::new());
    }
    let mut document = Document::draft(input, UserId::new());
    document.state = LifecycleState::Approved;
    document.is_posted = is_posted;
    document
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Every independent check contributes its own reason
    // =========================================================================

    #[test]
    fn prop_reasons_are_exhaustive(
        document_type in arb_document_type(),
        linked in any::<bool>(),
        is_posted in any::<bool>(),
        period_state in arb_period(),
        match_status in arb_match()
    ) {
        let document = approved(document_type, linked, is_posted);
        let context = PostingContext { period_state, match_status };
        let result = PostingGate::can_post(&document, &context);
        let reasons = result.reasons();

        let period_blocks = period_state != Some(PeriodState::Open);
        prop_assert_eq!(
            period_blocks,
            reasons.iter().any(|r| matches!(
                r,
                BlockReason::PeriodClosed | BlockReason::PeriodOnHold | BlockReason::PeriodNotFound
            ))
        );
        prop_assert_eq!(is_posted, reasons.contains(&BlockReason::AlreadyPosted));

        let match_blocks = document_type.requires_three_way_match()
            && !(linked && match_status == Some(MatchStatus::Matched));
        prop_assert_eq!(
            match_blocks,
            reasons.iter().any(|r| matches!(
                r,
                BlockReason::MatchReferencesMissing | BlockReason::MatchIncomplete(_)
            ))
        );

        prop_assert_eq!(result.is_clear(), !period_blocks && !is_posted && !match_blocks);
    }

    // =========================================================================
    // A closed period always blocks, whatever else holds
    // =========================================================================

    #[test]
    fn prop_closed_period_always_blocks(
        document_type in arb_document_type(),
        linked in any::<bool>(),
        match_status in arb_match()
    ) {
        let document = approved(document_type, linked, false);
        let context = PostingContext { period_state: Some(PeriodState::Closed), match_status };
        let result = PostingGate::can_post(&document, &context);
        prop_assert!(result.codes().contains(&"PeriodClosed"));
    }
}
