use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{RecordId, StoredRecord, Submission, SubmissionKind};
use super::store::{RecordQuery, RecordStore, StoreError};
use super::workflow::RecordPatch;

type Tables = BTreeMap<SubmissionKind, HashMap<RecordId, StoredRecord>>;

/// Process-local record store. Every operation holds one lock, so updates are atomic.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }

    pub fn len(&self, kind: SubmissionKind) -> usize {
        self.tables()
            .map(|tables| tables.get(&kind).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.tables()
            .map(|tables| tables.values().all(HashMap::is_empty))
            .unwrap_or(true)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, submission: Submission) -> Result<StoredRecord, StoreError> {
        let mut tables = self.tables()?;
        let table = tables.entry(submission.kind()).or_default();

        let mut id = RecordId::generate();
        while table.contains_key(&id) {
            id = RecordId::generate();
        }

        let record = StoredRecord {
            id,
            created_at: Utc::now(),
            submission,
        };
        table.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.get(&kind).and_then(|table| table.get(id)).cloned())
    }

    fn update(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<StoredRecord, StoreError> {
        let mut tables = self.tables()?;
        let record = tables
            .get_mut(&kind)
            .and_then(|table| table.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        // Apply to a copy so a rejected patch leaves the stored row untouched.
        let mut updated = record.clone();
        patch.apply(&mut updated)?;
        *record = updated.clone();
        Ok(updated)
    }

    fn delete(&self, kind: SubmissionKind, id: &RecordId) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables
            .get_mut(&kind)
            .and_then(|table| table.remove(id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .get(&query.kind)
            .map(|table| {
                table
                    .values()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
