//! Catalog error types
//!
//! Error codes:
//! - CAMPUS_INVALID_DATASET_ID (ERROR)
//! - CAMPUS_DATASET_EXISTS (ERROR)
//! - CAMPUS_DATASET_NOT_FOUND (ERROR)
//! - CAMPUS_EMPTY_DATASET (ERROR)
//! - CAMPUS_MALFORMED_RECORDS (ERROR)
//! - CAMPUS_DUPLICATE_PRIMARY_KEY (ERROR)
//! - CAMPUS_KIND_MISMATCH (ERROR)
//! - CAMPUS_STORAGE_IO (ERROR)
//! - CAMPUS_DATA_CORRUPTION (FATAL)

use std::fmt;
use std::io;
use std::path::Path;

use crate::dataset::{DatasetError, DatasetErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, server continues
    Error,
    /// Persisted state cannot be trusted; startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorCode {
    /// Id empty, whitespace-only or containing an underscore
    CampusInvalidDatasetId,
    CampusDatasetExists,
    CampusDatasetNotFound,
    /// Dataset would have zero rows
    CampusEmptyDataset,
    CampusMalformedRecords,
    CampusDuplicatePrimaryKey,
    CampusKindMismatch,
    /// Disk I/O failure
    CampusStorageIo,
    /// Persisted dataset failed its checksum or could not be decoded
    CampusDataCorruption,
}

impl CatalogErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogErrorCode::CampusInvalidDatasetId => "CAMPUS_INVALID_DATASET_ID",
            CatalogErrorCode::CampusDatasetExists => "CAMPUS_DATASET_EXISTS",
            CatalogErrorCode::CampusDatasetNotFound => "CAMPUS_DATASET_NOT_FOUND",
            CatalogErrorCode::CampusEmptyDataset => "CAMPUS_EMPTY_DATASET",
            CatalogErrorCode::CampusMalformedRecords => "CAMPUS_MALFORMED_RECORDS",
            CatalogErrorCode::CampusDuplicatePrimaryKey => "CAMPUS_DUPLICATE_PRIMARY_KEY",
            CatalogErrorCode::CampusKindMismatch => "CAMPUS_KIND_MISMATCH",
            CatalogErrorCode::CampusStorageIo => "CAMPUS_STORAGE_IO",
            CatalogErrorCode::CampusDataCorruption => "CAMPUS_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CatalogErrorCode::CampusDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for CatalogErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug)]
pub struct CatalogError {
    code: CatalogErrorCode,
    message: String,
    /// Dataset id the error refers to
    dataset_id: Option<String>,
    source: Option<io::Error>,
}

impl CatalogError {
    fn new(code: CatalogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            dataset_id: None,
            source: None,
        }
    }

    fn for_dataset(mut self, id: &str) -> Self {
        self.dataset_id = Some(id.to_string());
        self
    }

    pub fn invalid_dataset_id(id: &str) -> Self {
        Self::new(
            CatalogErrorCode::CampusInvalidDatasetId,
            format!("Invalid dataset id '{}'", id),
        )
        .for_dataset(id)
    }

    pub fn dataset_exists(id: &str) -> Self {
        Self::new(
            CatalogErrorCode::CampusDatasetExists,
            format!("Dataset '{}' already exists", id),
        )
        .for_dataset(id)
    }

    pub fn dataset_not_found(id: &str) -> Self {
        Self::new(
            CatalogErrorCode::CampusDatasetNotFound,
            format!("Dataset '{}' not found", id),
        )
        .for_dataset(id)
    }

    pub fn empty_dataset(id: &str) -> Self {
        Self::new(
            CatalogErrorCode::CampusEmptyDataset,
            format!("Dataset '{}' has no valid rows", id),
        )
        .for_dataset(id)
    }

    pub fn storage_io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: CatalogErrorCode::CampusStorageIo,
            message: message.into(),
            dataset_id: None,
            source: Some(source),
        }
    }

    pub fn io_at_path(path: &Path, source: io::Error) -> Self {
        Self::storage_io(format!("I/O error at {}", path.display()), source)
    }

    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self::new(CatalogErrorCode::CampusDataCorruption, message)
    }

    pub fn checksum_mismatch(id: &str, expected: u32, actual: u32) -> Self {
        Self::data_corruption(format!(
            "Checksum mismatch for dataset '{}': expected {:08x}, got {:08x}",
            id, expected, actual
        ))
        .for_dataset(id)
    }

    /// Attaches a dataset id to an error raised while building a store
    pub fn from_dataset(id: &str, err: DatasetError) -> Self {
        Self::from(err).for_dataset(id)
    }

    pub fn code(&self) -> CatalogErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<DatasetError> for CatalogError {
    fn from(err: DatasetError) -> Self {
        let code = match err.code() {
            DatasetErrorCode::CampusMalformedRecords => CatalogErrorCode::CampusMalformedRecords,
            DatasetErrorCode::CampusKindMismatch => CatalogErrorCode::CampusKindMismatch,
            DatasetErrorCode::CampusDuplicatePrimaryKey => {
                CatalogErrorCode::CampusDuplicatePrimaryKey
            }
        };
        Self::new(code, err.message())
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)?;
        if let Some(id) = &self.dataset_id {
            write!(f, " (dataset: {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CatalogError::invalid_dataset_id("a_b").code().code(),
            "CAMPUS_INVALID_DATASET_ID"
        );
        assert_eq!(
            CatalogError::dataset_not_found("x").code(),
            CatalogErrorCode::CampusDatasetNotFound
        );
    }

    #[test]
    fn test_corruption_is_fatal() {
        let err = CatalogError::checksum_mismatch("courses", 1, 2);
        assert!(err.is_fatal());
        assert!(!CatalogError::dataset_exists("courses").is_fatal());
    }

    #[test]
    fn test_display_format() {
        let display = format!("{}", CatalogError::dataset_exists("rooms"));
        assert!(display.starts_with("[ERROR] CAMPUS_DATASET_EXISTS:"));
        assert!(display.contains("(dataset: rooms)"));
    }

    #[test]
    fn test_wraps_dataset_error() {
        let err = CatalogError::from_dataset("courses", DatasetError::duplicate_primary_key("42"));
        assert_eq!(err.code(), CatalogErrorCode::CampusDuplicatePrimaryKey);
        assert_eq!(err.dataset_id(), Some("courses"));
    }

    #[test]
    fn test_io_source_preserved() {
        use std::error::Error;
        let err = CatalogError::storage_io("write failed", io::Error::new(io::ErrorKind::Other, "disk"));
        assert!(err.source().is_some());
    }
}
