//! Property-based tests for LifecycleService.

use chrono::NaiveDate;
use docflow_shared::types::UserId;
use proptest::prelude::*;

use crate::workflow::document::{Document, NewDocument};
use crate::workflow::lifecycle::{ALL_STATES, LifecycleService};
use crate::workflow::types::{DocumentType, LifecycleState};

fn arb_state() -> impl Strategy<Value = LifecycleState> {
    prop::sample::select(ALL_STATES.to_vec())
}

fn arb_document_type() -> impl Strategy<Value = DocumentType> {
    prop::sample::select(DocumentType::ALL.to_vec())
}

fn document_in(document_type: DocumentType, state: LifecycleState) -> Document {
    let mut document = Document::draft(
        NewDocument::new(
            document_type,
            "DOC-P",
            NaiveDate::from_ymd_opt(2026, 8, 8).unwrap(),
        ),
        UserId::new(),
    );
    document.state = state;
    document
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Terminal states never move
    // =========================================================================

    #[test]
    fn prop_terminal_states_have_no_exits(
        document_type in arb_document_type(),
        from in arb_state(),
        to in arb_state()
    ) {
        if from.is_terminal() {
            prop_assert!(!LifecycleService::is_valid_transition(document_type, from, to));
        }
    }

    // =========================================================================
    // Posted documents only ever become reversed
    // =========================================================================

    #[test]
    fn prop_posted_only_reverses(document_type in arb_document_type(), to in arb_state()) {
        let valid = LifecycleService::is_valid_transition(document_type, LifecycleState::Posted, to);
        prop_assert_eq!(valid, to == LifecycleState::Reversed);
    }

    // =========================================================================
    // Approved has exactly one posting target per document type
    // =========================================================================

    #[test]
    fn prop_approved_has_single_posting_target(document_type in arb_document_type()) {
        let targets = LifecycleService::allowed_targets(document_type, LifecycleState::Approved);
        prop_assert_eq!(targets, vec![document_type.posting_kind().target_state()]);
    }

    // =========================================================================
    // A rejected transition leaves the document untouched; an accepted one
    // records exactly one history event
    // =========================================================================

    #[test]
    fn prop_transition_matches_graph(
        document_type in arb_document_type(),
        from in arb_state(),
        to in arb_state()
    ) {
        let mut document = document_in(document_type, from);
        let before = document.clone();
        let result = LifecycleService::transition(&mut document, to, UserId::new(), None);

        if LifecycleService::is_valid_transition(document_type, from, to) {
            let event = result.unwrap();
            prop_assert_eq!(event.from, from);
            prop_assert_eq!(event.to, to);
            prop_assert_eq!(document.state, to);
            prop_assert_eq!(document.history.len(), before.history.len() + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(document, before);
        }
    }

    // =========================================================================
    // Only documents that track receipts reach receipt states
    // =========================================================================

    #[test]
    fn prop_receipt_states_require_tracking(
        document_type in arb_document_type(),
        from in arb_state()
    ) {
        for to in [LifecycleState::PartiallyReceived, LifecycleState::Received] {
            if LifecycleService::is_valid_transition(document_type, from, to) {
                prop_assert!(document_type.tracks_receipts());
            }
        }
    }
}
