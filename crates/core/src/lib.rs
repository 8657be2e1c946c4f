//! Core business logic for docflow.
//!
//! This crate contains the approval workflow and document lifecycle engine
//! with ZERO web or database dependencies. Persistence, fiscal periods and
//! three-way matching are reached through collaborator traits.
//!
//! # Modules
//!
//! - `workflow` - Definitions, approval instances, lifecycle and posting gate
//! - `fiscal` - Fiscal period states consulted by the posting gate

pub mod fiscal;
pub mod workflow;
