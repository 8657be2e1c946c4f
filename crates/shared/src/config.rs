//! Application configuration management.
//!
//! Workflow definitions are configuration: they are read once at startup and
//! never mutated at runtime.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// Workflow definitions, one per document type.
    #[serde(default)]
    pub workflows: Vec<WorkflowConfig>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "docflow=info".to_string()
}

/// Raw workflow definition as written in configuration.
///
/// Document types and roles stay as strings here; the core crate parses and
/// validates them when building its registry.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Document type code, e.g. `AP_INVOICE`.
    pub document_type: String,
    /// Human-readable workflow name.
    pub name: String,
    /// Ordered step templates.
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Raw step template as written in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// 1-based sequence number.
    pub sequence: u32,
    /// Step name.
    pub name: String,
    /// Optional description shown to approvers.
    #[serde(default)]
    pub description: Option<String>,
    /// Minimum role required to decide this step, e.g. `approver`.
    #[serde(default)]
    pub approver_role: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DOCFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Parses configuration from an in-memory TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or does not match the schema.
    pub fn from_toml_str(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
