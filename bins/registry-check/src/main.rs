//! docflow registry check
//!
//! Loads configuration, builds the workflow registry and reports every
//! document type it serves. Exits non-zero if any definition is invalid.

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use docflow_core::workflow::{DocumentType, WorkflowRegistry};
use docflow_shared::AppConfig;
use docflow_shared::config::LogConfig;

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log.filter.as_str().into());
    tracing_subscriber::registry()
        .with(filter)
        .with(log.json.then(|| fmt::layer().json()))
        .with((!log.json).then(fmt::layer))
        .init();
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let registry = match WorkflowRegistry::from_config(&config.workflows) {
        Ok(registry) => registry,
        Err(err) => {
            error!(error = %err, code = err.error_code(), "Workflow configuration rejected");
            return Err(err).context("Invalid workflow configuration");
        }
    };

    for document_type in registry.document_types() {
        let definition = registry.get_definition(document_type)?;
        let steps: Vec<&str> = definition.steps.iter().map(|s| s.name.as_str()).collect();
        info!(
            %document_type,
            workflow = %definition.name,
            step_count = definition.total_steps(),
            ?steps,
            posts_to = %document_type.posting_kind().target_state(),
            "Workflow ready"
        );
    }

    let missing: Vec<&str> = DocumentType::ALL
        .iter()
        .filter(|t| registry.get_definition(**t).is_err())
        .map(DocumentType::as_str)
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "Document types without a workflow cannot be submitted");
    }

    info!(workflows = registry.len(), "Registry check passed");
    Ok(())
}
