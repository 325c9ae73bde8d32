//! Observable events for campusdb
//!
//! Events are explicit and typed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Process startup begins
    BootStart,
    /// Startup complete, ready to serve
    BootComplete,
    /// Configuration loaded
    ConfigLoaded,
    /// Persisted datasets restored
    CatalogLoaded,

    // Catalog
    DatasetAdded,
    DatasetRemoved,
    /// Dataset file left on disk after its dataset was removed
    DatasetFileOrphaned,

    // Query
    /// Query answered
    QueryComplete,
    /// Query failed validation
    QueryRejected,
    /// Query exceeded the result ceiling
    QueryTooLarge,

    // Server
    /// HTTP listener bound
    ServerListening,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CatalogLoaded => "CATALOG_LOADED",
            Event::DatasetAdded => "DATASET_ADDED",
            Event::DatasetRemoved => "DATASET_REMOVED",
            Event::DatasetFileOrphaned => "DATASET_FILE_ORPHANED",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryTooLarge => "QUERY_TOO_LARGE",
            Event::ServerListening => "SERVER_LISTENING",
        }
    }

    /// Events describing a failed request
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::QueryRejected | Event::QueryTooLarge | Event::DatasetFileOrphaned
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
