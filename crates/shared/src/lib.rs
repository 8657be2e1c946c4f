//! Shared types, errors, and configuration for docflow.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for documents, approval instances, definitions and actors
//! - Pagination types for instance listings
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
