//! Property-based tests for workflow definition validation.

use proptest::prelude::*;

use crate::workflow::definition::{WorkflowDefinition, WorkflowRegistry, WorkflowStepTemplate};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::DocumentType;

fn definition_with(sequences: &[u32]) -> WorkflowDefinition {
    WorkflowDefinition::new(
        DocumentType::PurchaseOrder,
        "PO approval",
        sequences
            .iter()
            .map(|&n| WorkflowStepTemplate::new(n, format!("Step {n}")))
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Contiguous sequences from 1 are accepted in any declaration order
    // =========================================================================

    #[test]
    fn prop_contiguous_sequences_accepted(
        sequences in (1u32..=12).prop_flat_map(|n| Just((1..=n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let definition = definition_with(&sequences);
        prop_assert!(definition.validate().is_ok());
        let ordered: Vec<u32> = definition.steps.iter().map(|s| s.sequence).collect();
        let expected: Vec<u32> = (1..=u32::try_from(sequences.len()).unwrap()).collect();
        prop_assert_eq!(ordered, expected);
    }

    // =========================================================================
    // Anything else is rejected, and the registry stops serving the type
    // =========================================================================

    #[test]
    fn prop_non_contiguous_sequences_rejected(
        sequences in prop::collection::vec(0u32..20, 1..10)
    ) {
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        let contiguous = sorted
            .iter()
            .enumerate()
            .all(|(index, &n)| u32::try_from(index + 1).unwrap() == n);

        let registry = WorkflowRegistry::new();
        registry.register(definition_with(&[1])).unwrap();
        let result = registry.register(definition_with(&sequences));

        if contiguous {
            prop_assert!(result.is_ok());
        } else {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidDefinition { .. }));
            prop_assert!(is_invalid);
            prop_assert!(registry.get_definition(DocumentType::PurchaseOrder).is_err());
        }
    }
}
