//! Query validation error types
//!
//! Error codes:
//! - CAMPUS_QUERY_INVALID (REJECT)
//! - CAMPUS_UNKNOWN_DATASET (REJECT)
//! - CAMPUS_MULTIPLE_DATASETS (REJECT)
//! - CAMPUS_INVALID_KEY (REJECT)
//! - CAMPUS_TYPE_MISMATCH (REJECT)
//! - CAMPUS_INVALID_WILDCARD (REJECT)
//! - CAMPUS_INVALID_ORDER (REJECT)
//! - CAMPUS_DUPLICATE_APPLY (REJECT)
//!
//! Every code is a validation failure: the query is rejected as a whole
//! and no rows are produced.

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Query validation error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Malformed document structure
    CampusQueryInvalid,
    /// Referenced dataset is not registered
    CampusUnknownDataset,
    /// Query references more than one dataset
    CampusMultipleDatasets,
    /// Key is malformed or names no field of the dataset kind
    CampusInvalidKey,
    /// Field or literal has the wrong scalar type for its operator
    CampusTypeMismatch,
    /// Asterisk placed anywhere but the first or last character
    CampusInvalidWildcard,
    /// ORDER is malformed or references a key outside COLUMNS
    CampusInvalidOrder,
    /// APPLY rule name reused
    CampusDuplicateApply,
}

impl QueryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::CampusQueryInvalid => "CAMPUS_QUERY_INVALID",
            QueryErrorCode::CampusUnknownDataset => "CAMPUS_UNKNOWN_DATASET",
            QueryErrorCode::CampusMultipleDatasets => "CAMPUS_MULTIPLE_DATASETS",
            QueryErrorCode::CampusInvalidKey => "CAMPUS_INVALID_KEY",
            QueryErrorCode::CampusTypeMismatch => "CAMPUS_TYPE_MISMATCH",
            QueryErrorCode::CampusInvalidWildcard => "CAMPUS_INVALID_WILDCARD",
            QueryErrorCode::CampusInvalidOrder => "CAMPUS_INVALID_ORDER",
            QueryErrorCode::CampusDuplicateApply => "CAMPUS_DUPLICATE_APPLY",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query validation error with context
#[derive(Debug, Clone)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
    /// Offending key if applicable
    key: Option<String>,
}

impl QueryError {
    /// Create a malformed-document error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::CampusQueryInvalid,
            message: reason.into(),
            key: None,
        }
    }

    pub fn unknown_dataset(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            code: QueryErrorCode::CampusUnknownDataset,
            message: format!("Query references dataset '{}' which has not been added", id),
            key: None,
        }
    }

    pub fn multiple_datasets(first: &str, other: &str) -> Self {
        Self {
            code: QueryErrorCode::CampusMultipleDatasets,
            message: format!(
                "Cannot query more than one dataset ('{}' and '{}')",
                first, other
            ),
            key: None,
        }
    }

    /// Create an invalid key error for the given clause
    pub fn invalid_key(clause: &str, key: impl Into<String>) -> Self {
        let k = key.into();
        Self {
            code: QueryErrorCode::CampusInvalidKey,
            message: format!("Invalid key '{}' in {}", k, clause),
            key: Some(k),
        }
    }

    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::CampusTypeMismatch,
            message: reason.into(),
            key: None,
        }
    }

    pub fn invalid_wildcard(pattern: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::CampusInvalidWildcard,
            message: format!(
                "Invalid wildcard '{}': asterisks are only allowed as first or last character",
                pattern.into()
            ),
            key: None,
        }
    }

    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::CampusInvalidOrder,
            message: reason.into(),
            key: None,
        }
    }

    pub fn duplicate_apply(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            code: QueryErrorCode::CampusDuplicateApply,
            message: format!("Duplicate APPLY key '{}'", n),
            key: Some(n),
        }
    }

    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for QueryError {}

/// Result type for query validation
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QueryErrorCode::CampusQueryInvalid.code(), "CAMPUS_QUERY_INVALID");
        assert_eq!(
            QueryErrorCode::CampusMultipleDatasets.code(),
            "CAMPUS_MULTIPLE_DATASETS"
        );
        assert_eq!(
            QueryErrorCode::CampusInvalidWildcard.code(),
            "CAMPUS_INVALID_WILDCARD"
        );
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::invalid_key("COLUMNS", "courses_bogus");
        let display = format!("{}", err);
        assert!(display.starts_with("[REJECT] CAMPUS_INVALID_KEY"));
        assert!(display.contains("courses_bogus"));
        assert_eq!(err.key(), Some("courses_bogus"));
    }

    #[test]
    fn test_multiple_datasets_message() {
        let err = QueryError::multiple_datasets("courses", "rooms");
        assert!(err.message().contains("more than one dataset"));
    }
}
