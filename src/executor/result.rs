//! Result types for query execution

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::dataset::Scalar;

/// A key to scalar mapping with insertion-ordered keys.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `key`, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: Scalar) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Narrows to `columns`, in that order. Missing keys are skipped.
    pub fn project<'c>(&self, columns: impl IntoIterator<Item = &'c str>) -> Row {
        let mut out = Row::new();
        for column in columns {
            if let Some(value) = self.get(column) {
                out.entries.push((column.to_string(), value.clone()));
            }
        }
        out
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Answer to one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutput {
    /// Dataset the query was bound to
    #[serde(skip)]
    pub dataset_id: String,
    #[serde(rename = "result")]
    pub rows: Vec<Row>,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as a JSON array
    pub fn rows_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.rows).unwrap_or(serde_json::Value::Null)
    }
}
