//! IS pattern matching
//!
//! A pattern may start and/or end with `*`. No other asterisks are allowed.

use crate::query::{QueryError, QueryResult};

/// A parsed IS pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wildcard {
    /// `abc`
    Exact(String),
    /// `abc*`
    Prefix(String),
    /// `*abc`
    Suffix(String),
    /// `*abc*`
    Contains(String),
}

impl Wildcard {
    /// Parses a pattern, rejecting interior or surplus asterisks
    pub fn parse(pattern: &str) -> QueryResult<Self> {
        let leading = pattern.starts_with('*');
        let rest = if leading { &pattern[1..] } else { pattern };
        let trailing = rest.ends_with('*');
        let core = if trailing { &rest[..rest.len() - 1] } else { rest };

        if core.contains('*') {
            return Err(QueryError::invalid_wildcard(pattern));
        }

        let core = core.to_string();
        Ok(match (leading, trailing) {
            (false, false) => Wildcard::Exact(core),
            (false, true) => Wildcard::Prefix(core),
            (true, false) => Wildcard::Suffix(core),
            (true, true) => Wildcard::Contains(core),
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Wildcard::Exact(s) => value == s,
            Wildcard::Prefix(s) => value.starts_with(s.as_str()),
            Wildcard::Suffix(s) => value.ends_with(s.as_str()),
            Wildcard::Contains(s) => value.contains(s.as_str()),
        }
    }
}
