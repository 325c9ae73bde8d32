//! In-memory record store
//!
//! A store holds records of exactly one kind with unique primary keys.
//! It is immutable once built; queries borrow it read-only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::{DatasetError, DatasetResult};
use super::kind::DatasetKind;
use super::record::Record;

/// Immutable collection of same-kind records
#[derive(Debug, Clone)]
pub struct RecordStore {
    kind: DatasetKind,
    records: Vec<Record>,
}

impl RecordStore {
    /// Builds a store, rejecting foreign-kind records and duplicate keys.
    pub fn new(kind: DatasetKind, records: Vec<Record>) -> DatasetResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if record.kind() != kind {
                return Err(DatasetError::kind_mismatch(kind, record.kind()));
            }
            let key = record.primary_key();
            if !seen.insert(key) {
                return Err(DatasetError::duplicate_primary_key(key));
            }
        }
        Ok(Self { kind, records })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at a scan position
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Iterates `(position, record)` in scan order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records.iter().enumerate()
    }
}

/// A registered dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    id: String,
    store: RecordStore,
}

impl Dataset {
    pub fn new(id: impl Into<String>, store: RecordStore) -> Self {
        Self {
            id: id.into(),
            store,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DatasetKind {
        self.store.kind()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            id: self.id.clone(),
            kind: self.kind(),
            num_rows: self.store.len(),
        }
    }
}

/// Catalog listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub id: String,
    pub kind: DatasetKind,
    pub num_rows: usize,
}
