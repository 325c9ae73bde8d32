//! Dataset-qualified key parsing
//!
//! A key `<datasetId>_<field>` has exactly one underscore. Dataset ids and
//! field names can therefore never contain one.

use crate::dataset::{DatasetKind, Field};

use super::errors::{QueryError, QueryResult};

/// A key split into its dataset id and bare field name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub dataset_id: &'a str,
    pub field: &'a str,
}

impl<'a> KeyParts<'a> {
    /// Splits `key` at its single underscore.
    ///
    /// Returns `None` for zero or several underscores.
    pub fn split(key: &'a str) -> Option<Self> {
        let mut parts = key.split('_');
        let dataset_id = parts.next()?;
        let field = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { dataset_id, field })
    }

    /// Resolves the field name against a kind
    pub fn resolve(&self, kind: DatasetKind) -> Option<Field> {
        Field::parse(kind, self.field)
    }
}

/// Splits a key or fails with `CAMPUS_INVALID_KEY` naming the clause
pub fn split_key<'a>(clause: &str, key: &'a str) -> QueryResult<KeyParts<'a>> {
    KeyParts::split(key).ok_or_else(|| QueryError::invalid_key(clause, key))
}
