//! In-memory collaborators.
//!
//! Each document and its approval instances live in one map entry, so the
//! entry lock serializes writes to one document without a global lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use docflow_shared::types::{ApprovalInstanceId, DocumentId, FiscalPeriodId};
use tokio::sync::{OwnedRwLockReadGuard, RwLock};

use crate::fiscal::{FiscalPeriod, PeriodState};
use crate::workflow::document::Document;
use crate::workflow::instance::ApprovalInstance;
use crate::workflow::store::{
    ChangeSet, Committed, DocumentStore, InstanceChange, InstanceFilter, MatchService,
    PeriodService, StoreError,
};
use crate::workflow::types::MatchStatus;

#[derive(Debug, Clone)]
struct DocumentRecord {
    document: Document,
    instances: Vec<ApprovalInstance>,
}

/// Document store backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    records: DashMap<DocumentId, DocumentRecord>,
    instance_index: DashMap<ApprovalInstanceId, DocumentId>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.records.len()
    }

    fn insert_new(&self, mut document: Document) -> Result<Document, StoreError> {
        let id = document.id;
        match self.records.entry(id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(id)),
            Entry::Vacant(slot) => {
                document.version += 1;
                slot.insert(DocumentRecord {
                    document: document.clone(),
                    instances: Vec::new(),
                });
                Ok(document)
            }
        }
    }

    fn rollback(&self, inserted: &[Document]) {
        for document in inserted {
            self.records.remove(&document.id);
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_document(&self, document: Document) -> Result<Document, StoreError> {
        self.insert_new(document)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.document.clone()))
    }

    async fn delete_document(
        &self,
        id: DocumentId,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let removed = self
            .records
            .remove_if(&id, |_, record| record.document.version == expected_version);
        match removed {
            Some((_, record)) => {
                for instance in &record.instances {
                    self.instance_index.remove(&instance.id);
                }
                Ok(())
            }
            None if self.records.contains_key(&id) => Err(StoreError::Conflict(id)),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn get_instance(
        &self,
        id: ApprovalInstanceId,
    ) -> Result<Option<ApprovalInstance>, StoreError> {
        let Some(document_id) = self.instance_index.get(&id).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.records.get(&document_id).and_then(|record| {
            record.instances.iter().find(|i| i.id == id).cloned()
        }))
    }

    async fn list_instances(
        &self,
        filter: &InstanceFilter,
    ) -> Result<Vec<ApprovalInstance>, StoreError> {
        let mut instances: Vec<ApprovalInstance> = self
            .records
            .iter()
            .flat_map(|record| {
                record
                    .instances
                    .iter()
                    .filter(|i| filter.matches(i))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        instances.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Committed, StoreError> {
        let ChangeSet {
            mut document,
            instance,
            created,
        } = changes;
        let document_id = document.id;

        // New documents are unreachable until the original links to them
        let mut inserted = Vec::with_capacity(created.len());
        for new_document in created {
            match self.insert_new(new_document) {
                Ok(stored) => inserted.push(stored),
                Err(err) => {
                    self.rollback(&inserted);
                    return Err(err);
                }
            }
        }

        let written_instance = {
            let Some(mut record) = self.records.get_mut(&document_id) else {
                self.rollback(&inserted);
                return Err(StoreError::NotFound(document_id));
            };

            if record.document.version != document.version {
                drop(record);
                self.rollback(&inserted);
                return Err(StoreError::Conflict(document_id));
            }

            let instance_fresh = match &instance {
                Some(InstanceChange::Insert(new)) => {
                    !record.instances.iter().any(|i| i.id == new.id)
                }
                Some(InstanceChange::Update(updated)) => record
                    .instances
                    .iter()
                    .any(|i| i.id == updated.id && i.version == updated.version),
                None => true,
            };
            if !instance_fresh {
                drop(record);
                self.rollback(&inserted);
                return Err(StoreError::Conflict(document_id));
            }

            document.version += 1;
            record.document = document.clone();

            match instance {
                Some(InstanceChange::Insert(mut new)) => {
                    new.version += 1;
                    record.instances.push(new.clone());
                    Some(new)
                }
                Some(InstanceChange::Update(mut updated)) => {
                    updated.version += 1;
                    if let Some(stored) = record.instances.iter_mut().find(|i| i.id == updated.id) {
                        *stored = updated.clone();
                    }
                    Some(updated)
                }
                None => None,
            }
        };

        if let Some(instance) = &written_instance {
            self.instance_index.insert(instance.id, document_id);
        }

        Ok(Committed {
            document,
            instance: written_instance,
            created: inserted,
        })
    }
}

/// Period service backed by a list of periods.
///
/// Each period sits behind its own async lock: posting holds take it shared,
/// state changes take it exclusively and wait for outstanding holds.
#[derive(Debug, Default)]
pub struct InMemoryPeriodService {
    periods: DashMap<FiscalPeriodId, Arc<RwLock<FiscalPeriod>>>,
}

impl InMemoryPeriodService {
    /// Creates an empty period service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a period. An id that is already present keeps its stored period.
    pub fn add_period(&self, period: FiscalPeriod) -> FiscalPeriodId {
        let id = period.id;
        self.periods
            .entry(id)
            .or_insert_with(|| Arc::new(RwLock::new(period)));
        id
    }

    /// Changes a period's state, as period management would.
    ///
    /// Waits for postings that hold the period. Returns false if the period
    /// is unknown.
    pub async fn set_state(&self, id: FiscalPeriodId, state: PeriodState) -> bool {
        let Some(slot) = self.periods.get(&id).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        slot.write().await.state = state;
        true
    }

    /// Narrowest period covering `date`, read-locked.
    ///
    /// Overlaps resolve to the shortest span, so a closed month inside an
    /// open year wins. Equal spans fall back to the lower id.
    async fn covering(&self, date: NaiveDate) -> Option<OwnedRwLockReadGuard<FiscalPeriod>> {
        let slots: Vec<_> = self.periods.iter().map(|e| Arc::clone(e.value())).collect();
        let mut narrowest: Option<OwnedRwLockReadGuard<FiscalPeriod>> = None;
        for slot in slots {
            let period = slot.read_owned().await;
            if !period.contains_date(date) {
                continue;
            }
            if narrowest
                .as_ref()
                .is_none_or(|current| span(&period) < span(current))
            {
                narrowest = Some(period);
            }
        }
        narrowest
    }
}

fn span(period: &FiscalPeriod) -> (i64, FiscalPeriodId) {
    ((period.end_date - period.start_date).num_days(), period.id)
}

#[async_trait]
impl PeriodService for InMemoryPeriodService {
    type Hold = Option<OwnedRwLockReadGuard<FiscalPeriod>>;

    async fn get_period_state(&self, date: NaiveDate) -> Result<Option<PeriodState>, StoreError> {
        Ok(self.covering(date).await.map(|p| p.state))
    }

    async fn hold_period(
        &self,
        date: NaiveDate,
    ) -> Result<(Option<PeriodState>, Self::Hold), StoreError> {
        let period = self.covering(date).await;
        Ok((period.as_ref().map(|p| p.state), period))
    }
}

/// Match service backed by a map of PO / receipt pairs.
#[derive(Debug, Default)]
pub struct InMemoryMatchService {
    statuses: DashMap<(DocumentId, DocumentId), MatchStatus>,
}

impl InMemoryMatchService {
    /// Creates an empty match service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the match status for a pair.
    pub fn set_status(
        &self,
        purchase_order: DocumentId,
        goods_receipt: DocumentId,
        status: MatchStatus,
    ) {
        self.statuses.insert((purchase_order, goods_receipt), status);
    }
}

#[async_trait]
impl MatchService for InMemoryMatchService {
    async fn get_match_status(
        &self,
        purchase_order: DocumentId,
        goods_receipt: DocumentId,
    ) -> Result<MatchStatus, StoreError> {
        Ok(self
            .statuses
            .get(&(purchase_order, goods_receipt))
            .map_or(MatchStatus::Pending, |s| *s.value()))
    }
}
