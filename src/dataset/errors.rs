//! Dataset error types
//!
//! Error codes:
//! - CAMPUS_MALFORMED_RECORDS (ERROR)
//! - CAMPUS_KIND_MISMATCH (ERROR)
//! - CAMPUS_DUPLICATE_PRIMARY_KEY (ERROR)

use std::fmt;

/// Dataset-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetErrorCode {
    /// Rows do not have the shape of the declared kind
    CampusMalformedRecords,
    /// A record's kind differs from the store's kind
    CampusKindMismatch,
    /// Two records share a primary key
    CampusDuplicatePrimaryKey,
}

impl DatasetErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            DatasetErrorCode::CampusMalformedRecords => "CAMPUS_MALFORMED_RECORDS",
            DatasetErrorCode::CampusKindMismatch => "CAMPUS_KIND_MISMATCH",
            DatasetErrorCode::CampusDuplicatePrimaryKey => "CAMPUS_DUPLICATE_PRIMARY_KEY",
        }
    }
}

impl fmt::Display for DatasetErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Dataset error type
#[derive(Debug, Clone)]
pub struct DatasetError {
    code: DatasetErrorCode,
    message: String,
}

impl DatasetError {
    pub fn malformed_records(reason: impl Into<String>) -> Self {
        Self {
            code: DatasetErrorCode::CampusMalformedRecords,
            message: reason.into(),
        }
    }

    pub fn kind_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self {
            code: DatasetErrorCode::CampusKindMismatch,
            message: format!("Expected {} record, found {}", expected, found),
        }
    }

    pub fn duplicate_primary_key(key: impl Into<String>) -> Self {
        Self {
            code: DatasetErrorCode::CampusDuplicatePrimaryKey,
            message: format!("Duplicate primary key '{}'", key.into()),
        }
    }

    pub fn code(&self) -> DatasetErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for DatasetError {}

pub type DatasetResult<T> = Result<T, DatasetError>;
