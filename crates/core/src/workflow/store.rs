//! Collaborator interfaces consumed by the engine.
//!
//! The document store is the unit of atomicity: a document and its approval
//! instances commit together under one optimistic version check.

use async_trait::async_trait;
use chrono::NaiveDate;
use docflow_shared::types::{ApprovalInstanceId, DocumentId};
use thiserror::Error;

use crate::fiscal::PeriodState;
use crate::workflow::document::Document;
use crate::workflow::error::WorkflowError;
use crate::workflow::instance::ApprovalInstance;
use crate::workflow::types::{ApprovalStatus, DocumentType, MatchStatus};

/// Errors reported by collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A version check failed.
    #[error("Version conflict on document {0}")]
    Conflict(DocumentId),

    /// The addressed document does not exist.
    #[error("Document {0} not found in store")]
    NotFound(DocumentId),

    /// Backend failure.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(id) => Self::ConcurrentModification(id),
            StoreError::NotFound(id) => Self::DocumentNotFound(id),
            StoreError::Backend(message) => Self::Store(message),
        }
    }
}

/// Instance write carried by a change set.
#[derive(Debug, Clone)]
pub enum InstanceChange {
    /// A new instance; must not exist yet.
    Insert(ApprovalInstance),
    /// An existing instance at the version it was read.
    Update(ApprovalInstance),
}

/// Everything one engine operation writes, committed atomically.
///
/// `document` and an updated instance carry the version they were read at.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    /// The document being written.
    pub document: Document,
    /// Instance insert or update, if any.
    pub instance: Option<InstanceChange>,
    /// Brand-new documents (reversing documents).
    pub created: Vec<Document>,
}

impl ChangeSet {
    /// A change set touching only `document`.
    #[must_use]
    pub fn document(document: Document) -> Self {
        Self {
            document,
            instance: None,
            created: Vec::new(),
        }
    }

    /// Adds an instance write.
    #[must_use]
    pub fn with_instance(mut self, change: InstanceChange) -> Self {
        self.instance = Some(change);
        self
    }

    /// Adds a newly created document.
    #[must_use]
    pub fn with_created(mut self, document: Document) -> Self {
        self.created.push(document);
        self
    }
}

/// What the store holds after a successful commit, versions bumped.
#[derive(Debug, Clone)]
pub struct Committed {
    /// The written document.
    pub document: Document,
    /// The written instance.
    pub instance: Option<ApprovalInstance>,
    /// The created documents.
    pub created: Vec<Document>,
}

/// Filter for instance listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceFilter {
    /// Only instances for this document type.
    pub document_type: Option<DocumentType>,
    /// Only instances for this document.
    pub document_id: Option<DocumentId>,
    /// Only instances with this overall status.
    pub status: Option<ApprovalStatus>,
}

impl InstanceFilter {
    /// Returns true if `instance` passes the filter.
    #[must_use]
    pub fn matches(&self, instance: &ApprovalInstance) -> bool {
        self.document_type
            .is_none_or(|t| instance.document_type == t)
            && self.document_id.is_none_or(|id| instance.document_id == id)
            && self.status.is_none_or(|s| instance.status == s)
    }
}

/// Document store with optimistic-lock writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document; fails with `Conflict` if the id exists.
    async fn insert_document(&self, document: Document) -> Result<Document, StoreError>;

    /// Reads a document.
    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Hard-deletes a document at `expected_version`.
    async fn delete_document(&self, id: DocumentId, expected_version: u64)
    -> Result<(), StoreError>;

    /// Reads an approval instance.
    async fn get_instance(
        &self,
        id: ApprovalInstanceId,
    ) -> Result<Option<ApprovalInstance>, StoreError>;

    /// Lists instances passing `filter`, ordered by creation.
    async fn list_instances(
        &self,
        filter: &InstanceFilter,
    ) -> Result<Vec<ApprovalInstance>, StoreError>;

    /// Atomically applies a change set.
    ///
    /// Fails with `Conflict` without writing anything if the stored document
    /// or instance version differs from the one in the change set.
    async fn commit(&self, changes: ChangeSet) -> Result<Committed, StoreError>;
}

/// Period-management lookups.
#[async_trait]
pub trait PeriodService: Send + Sync {
    /// Keeps the state of a held period from changing while alive.
    type Hold: Send;

    /// State of the period covering `date`, or `None` if no period covers it.
    async fn get_period_state(&self, date: NaiveDate) -> Result<Option<PeriodState>, StoreError>;

    /// Reads the state of the period covering `date` and pins it until the
    /// returned hold is dropped.
    ///
    /// Posting keeps the hold across its commit, so a period cannot close
    /// between the gate check and the write.
    async fn hold_period(
        &self,
        date: NaiveDate,
    ) -> Result<(Option<PeriodState>, Self::Hold), StoreError>;
}

/// Three-way match lookups.
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Match status of a purchase order / goods receipt pair.
    async fn get_match_status(
        &self,
        purchase_order: DocumentId,
        goods_receipt: DocumentId,
    ) -> Result<MatchStatus, StoreError>;
}
