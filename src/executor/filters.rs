//! Filter tree evaluation
//!
//! Every leaf is a full scan of the store. Combinators evaluate each child
//! independently against the whole store and combine the resulting sets.
//! Sets hold scan positions, which map one-to-one onto primary keys.

use std::collections::BTreeSet;

use crate::dataset::{FieldValue, Record, RecordStore};
use crate::query::{Filter, QueryResult};

use super::wildcard::Wildcard;

/// Scan positions of matching records, iterated in scan order
pub type MatchSet = BTreeSet<usize>;

/// Records present in both sets
pub fn intersect(a: &MatchSet, b: &MatchSet) -> MatchSet {
    a.intersection(b).copied().collect()
}

/// Records present in either set, each once
pub fn union(a: &MatchSet, b: &MatchSet) -> MatchSet {
    a.union(b).copied().collect()
}

/// Records of `a` absent from `b`
pub fn subtract(a: &MatchSet, b: &MatchSet) -> MatchSet {
    a.difference(b).copied().collect()
}

/// Evaluates filters against one store
pub struct FilterEvaluator<'a> {
    store: &'a RecordStore,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Every record of the store
    pub fn all(&self) -> MatchSet {
        (0..self.store.len()).collect()
    }

    /// Evaluates an optional WHERE; `None` matches every record
    pub fn matching(&self, filter: Option<&Filter>) -> QueryResult<MatchSet> {
        match filter {
            Some(filter) => self.evaluate(filter),
            None => Ok(self.all()),
        }
    }

    /// Evaluates a filter tree.
    ///
    /// Fails only on a malformed IS pattern.
    pub fn evaluate(&self, filter: &Filter) -> QueryResult<MatchSet> {
        match filter {
            Filter::And(children) => {
                let mut acc: Option<MatchSet> = None;
                for child in children {
                    let matched = self.evaluate(child)?;
                    acc = Some(match acc {
                        Some(prev) => intersect(&prev, &matched),
                        None => matched,
                    });
                }
                Ok(acc.unwrap_or_else(|| self.all()))
            }
            Filter::Or(children) => {
                let mut acc = MatchSet::new();
                for child in children {
                    acc = union(&acc, &self.evaluate(child)?);
                }
                Ok(acc)
            }
            Filter::Not(inner) => Ok(subtract(&self.all(), &self.evaluate(inner)?)),
            Filter::Compare { op, field, value } => Ok(self.scan(|record| {
                record
                    .value(*field)
                    .and_then(|v| v.as_number())
                    .map(|n| op.matches(n, *value))
                    .unwrap_or(false)
            })),
            Filter::Is { field, pattern } => {
                let wildcard = Wildcard::parse(pattern)?;
                Ok(self.scan(|record| match record.value(*field) {
                    Some(FieldValue::Text(s)) => wildcard.matches(s),
                    _ => false,
                }))
            }
        }
    }

    fn scan<F>(&self, predicate: F) -> MatchSet
    where
        F: Fn(&Record) -> bool,
    {
        self.store
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(pos, _)| pos)
            .collect()
    }
}
