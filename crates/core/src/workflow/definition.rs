//! Workflow definition registry.
//!
//! Holds one ordered, immutable step sequence per document type. Definitions
//! are validated on registration; a type whose definition fails validation is
//! never served.

use std::sync::Arc;

use dashmap::DashMap;
use docflow_shared::config::WorkflowConfig;
use docflow_shared::types::WorkflowDefinitionId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::workflow::approval::UserRole;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::DocumentType;

/// One stage of a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStepTemplate {
    /// 1-based position within the workflow.
    pub sequence: u32,
    /// Step name shown to approvers.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Minimum role required to decide the step.
    pub approver_role: Option<UserRole>,
}

impl WorkflowStepTemplate {
    /// Creates a step template without description or role requirement.
    #[must_use]
    pub fn new(sequence: u32, name: impl Into<String>) -> Self {
        Self {
            sequence,
            name: name.into(),
            description: None,
            approver_role: None,
        }
    }

    /// Sets the role required to decide this step.
    #[must_use]
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.approver_role = Some(role);
        self
    }

    /// Sets the step description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered approval steps for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique identifier, fresh per registration.
    pub id: WorkflowDefinitionId,
    /// Document type this definition governs.
    pub document_type: DocumentType,
    /// Human-readable workflow name.
    pub name: String,
    /// Step templates ordered by sequence.
    pub steps: Vec<WorkflowStepTemplate>,
}

impl WorkflowDefinition {
    /// Creates a definition; steps are ordered by sequence.
    #[must_use]
    pub fn new(
        document_type: DocumentType,
        name: impl Into<String>,
        mut steps: Vec<WorkflowStepTemplate>,
    ) -> Self {
        steps.sort_by_key(|s| s.sequence);
        Self {
            id: WorkflowDefinitionId::new(),
            document_type,
            name: name.into(),
            steps,
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Validates the definition.
    ///
    /// Sequence numbers must be contiguous from 1 without duplicates, and
    /// the workflow must have at least one named step.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let invalid = |reason: String| WorkflowError::InvalidDefinition {
            document_type: self.document_type.as_str().to_string(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("workflow name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(invalid("workflow has no steps".to_string()));
        }

        let mut sequences: Vec<u32> = self.steps.iter().map(|s| s.sequence).collect();
        sequences.sort_unstable();
        for (expected, actual) in (1u32..).zip(sequences.iter().copied()) {
            if actual == 0 {
                return Err(invalid("step sequences start at 1".to_string()));
            }
            if actual < expected {
                return Err(invalid(format!("duplicate step sequence {actual}")));
            }
            if actual > expected {
                return Err(invalid(format!(
                    "step sequence gap: expected {expected}, found {actual}"
                )));
            }
        }

        if let Some(step) = self.steps.iter().find(|s| s.name.trim().is_empty()) {
            return Err(invalid(format!("step {} has no name", step.sequence)));
        }

        Ok(())
    }

    /// Builds a definition from raw configuration.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, WorkflowError> {
        let invalid = |reason: String| WorkflowError::InvalidDefinition {
            document_type: config.document_type.clone(),
            reason,
        };

        let document_type = DocumentType::parse(&config.document_type)
            .ok_or_else(|| invalid("unknown document type".to_string()))?;

        let steps = config
            .steps
            .iter()
            .map(|step| {
                let approver_role = match step.approver_role.as_deref() {
                    Some(raw) => Some(UserRole::parse(raw).ok_or_else(|| {
                        invalid(format!("step {} has unknown role {raw}", step.sequence))
                    })?),
                    None => None,
                };
                Ok(WorkflowStepTemplate {
                    sequence: step.sequence,
                    name: step.name.clone(),
                    description: step.description.clone(),
                    approver_role,
                })
            })
            .collect::<Result<Vec<_>, WorkflowError>>()?;

        let definition = Self::new(document_type, config.name.clone(), steps);
        definition.validate()?;
        Ok(definition)
    }
}

/// Registry of workflow definitions keyed by document type.
///
/// Safe for concurrent reads once loaded.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    definitions: DashMap<DocumentType, Arc<WorkflowDefinition>>,
}

impl WorkflowRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from configuration.
    ///
    /// Any invalid entry, or two entries for the same document type, is fatal.
    pub fn from_config(configs: &[WorkflowConfig]) -> Result<Self, WorkflowError> {
        let registry = Self::new();
        for config in configs {
            let definition = WorkflowDefinition::from_config(config)?;
            if registry.definitions.contains_key(&definition.document_type) {
                return Err(WorkflowError::InvalidDefinition {
                    document_type: config.document_type.clone(),
                    reason: "document type defined more than once".to_string(),
                });
            }
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Registers (or replaces) the definition for its document type.
    ///
    /// Steps are stored in sequence order whatever order they arrive in. On
    /// validation failure the document type stops being served, even if a
    /// previous definition existed. In-flight instances keep their snapshot.
    pub fn register(
        &self,
        mut definition: WorkflowDefinition,
    ) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
        let document_type = definition.document_type;
        definition.steps.sort_by_key(|s| s.sequence);
        if let Err(err) = definition.validate() {
            self.definitions.remove(&document_type);
            error!(%document_type, error = %err, "Rejected workflow definition");
            return Err(err);
        }

        let definition = Arc::new(definition);
        debug!(
            %document_type,
            definition_id = %definition.id,
            steps = definition.total_steps(),
            "Registered workflow definition"
        );
        self.definitions
            .insert(document_type, Arc::clone(&definition));
        Ok(definition)
    }

    /// Looks up the definition for a document type.
    pub fn get_definition(
        &self,
        document_type: DocumentType,
    ) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
        self.definitions
            .get(&document_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(WorkflowError::DefinitionNotFound(document_type))
    }

    /// Registered document types, sorted.
    #[must_use]
    pub fn document_types(&self) -> Vec<DocumentType> {
        let mut types: Vec<_> = self.definitions.iter().map(|e| *e.key()).collect();
        types.sort();
        types
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::document::{Document, NewDocument};
    use crate::workflow::instance::InstanceService;
    use chrono::NaiveDate;
    use docflow_shared::config::StepConfig;
    use docflow_shared::types::UserId;

    fn steps(sequences: &[u32]) -> Vec<WorkflowStepTemplate> {
        sequences
            .iter()
            .map(|&n| WorkflowStepTemplate::new(n, format!("Step {n}")))
            .collect()
    }

    fn step_config(sequence: u32, role: Option<&str>) -> StepConfig {
        StepConfig {
            sequence,
            name: format!("Step {sequence}"),
            description: None,
            approver_role: role.map(str::to_string),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = WorkflowRegistry::new();
        let definition = WorkflowDefinition::new(
            DocumentType::ApInvoice,
            "Invoice approval",
            steps(&[1, 2, 3]),
        );
        registry.register(definition).unwrap();

        let found = registry.get_definition(DocumentType::ApInvoice).unwrap();
        assert_eq!(found.total_steps(), 3);
        assert_eq!(registry.document_types(), vec![DocumentType::ApInvoice]);
    }

    #[test]
    fn test_unknown_type_not_found() {
        let registry = WorkflowRegistry::new();
        assert!(matches!(
            registry.get_definition(DocumentType::PurchaseOrder),
            Err(WorkflowError::DefinitionNotFound(DocumentType::PurchaseOrder))
        ));
    }

    #[test]
    fn test_steps_are_ordered_by_sequence() {
        let definition =
            WorkflowDefinition::new(DocumentType::ApInvoice, "Invoice", steps(&[3, 1, 2]));
        let order: Vec<u32> = definition.steps.iter().map(|s| s.sequence).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn test_gap_rejected() {
        let definition =
            WorkflowDefinition::new(DocumentType::ApInvoice, "Invoice", steps(&[1, 3]));
        let err = definition.validate().unwrap_err();
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let definition =
            WorkflowDefinition::new(DocumentType::ApInvoice, "Invoice", steps(&[1, 2, 2]));
        let err = definition.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_must_start_at_one() {
        let definition =
            WorkflowDefinition::new(DocumentType::ApInvoice, "Invoice", steps(&[2, 3]));
        assert!(matches!(
            definition.validate(),
            Err(WorkflowError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_empty_rejected() {
        let definition = WorkflowDefinition::new(DocumentType::ApInvoice, "Invoice", vec![]);
        assert!(definition.validate().is_err());
    }

    #[test]
    fn test_invalid_registration_stops_serving_type() {
        let registry = WorkflowRegistry::new();
        registry
            .register(WorkflowDefinition::new(
                DocumentType::PurchaseOrder,
                "PO",
                steps(&[1]),
            ))
            .unwrap();

        let bad = WorkflowDefinition::new(DocumentType::PurchaseOrder, "PO", steps(&[1, 1]));
        assert!(registry.register(bad).is_err());
        assert!(registry.get_definition(DocumentType::PurchaseOrder).is_err());
    }

    #[test]
    fn test_replacement_does_not_touch_existing_snapshot() {
        let registry = WorkflowRegistry::new();
        let first = registry
            .register(WorkflowDefinition::new(
                DocumentType::ApInvoice,
                "v1",
                steps(&[1, 2]),
            ))
            .unwrap();
        registry
            .register(WorkflowDefinition::new(
                DocumentType::ApInvoice,
                "v2",
                steps(&[1]),
            ))
            .unwrap();

        assert_eq!(first.total_steps(), 2);
        let current = registry.get_definition(DocumentType::ApInvoice).unwrap();
        assert_eq!(current.name, "v2");
        assert_ne!(current.id, first.id);
    }

    #[test]
    fn test_register_orders_deserialized_steps() {
        let definition: WorkflowDefinition = serde_json::from_value(serde_json::json!({
            "id": WorkflowDefinitionId::new(),
            "document_type": DocumentType::ApInvoice,
            "name": "Invoice approval",
            "steps": [
                { "sequence": 2, "name": "Controller", "description": null, "approver_role": null },
                { "sequence": 1, "name": "Manager", "description": null, "approver_role": null }
            ]
        }))
        .unwrap();
        assert_eq!(definition.steps[0].sequence, 2);

        let registered = WorkflowRegistry::new().register(definition).unwrap();
        let order: Vec<u32> = registered.steps.iter().map(|s| s.sequence).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(registered.steps[0].name, "Manager");

        let mut document = Document::draft(
            NewDocument::new(
                DocumentType::ApInvoice,
                "INV-9",
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            ),
            UserId::new(),
        );
        let instance =
            InstanceService::submit(&mut document, None, &registered, UserId::new()).unwrap();
        assert_eq!(instance.current_sequence(), Some(1));
    }

    #[test]
    fn test_from_config() {
        let configs = vec![WorkflowConfig {
            document_type: "ap_invoice".to_string(),
            name: "Invoice approval".to_string(),
            steps: vec![step_config(2, Some("accountant")), step_config(1, None)],
        }];
        let registry = WorkflowRegistry::from_config(&configs).unwrap();
        let definition = registry.get_definition(DocumentType::ApInvoice).unwrap();
        assert_eq!(definition.steps[0].sequence, 1);
        assert_eq!(definition.steps[1].approver_role, Some(UserRole::Accountant));
    }

    #[test]
    fn test_from_config_unknown_role_is_fatal() {
        let configs = vec![WorkflowConfig {
            document_type: "AP_INVOICE".to_string(),
            name: "Invoice approval".to_string(),
            steps: vec![step_config(1, Some("cfo"))],
        }];
        let err = WorkflowRegistry::from_config(&configs).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DEFINITION");
    }

    #[test]
    fn test_from_config_duplicate_type_is_fatal() {
        let config = WorkflowConfig {
            document_type: "PURCHASE_ORDER".to_string(),
            name: "PO".to_string(),
            steps: vec![step_config(1, None)],
        };
        let err = WorkflowRegistry::from_config(&[config.clone(), config]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_from_config_unknown_type_is_fatal() {
        let config = WorkflowConfig {
            document_type: "CREDIT_NOTE".to_string(),
            name: "Credit".to_string(),
            steps: vec![step_config(1, None)],
        };
        assert!(WorkflowRegistry::from_config(&[config]).is_err());
    }
}
