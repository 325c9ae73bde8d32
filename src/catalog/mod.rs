//! Catalog subsystem for campusdb
//!
//! Owns every registered dataset and, when given a data directory, keeps a
//! checksummed copy of each on disk.
//!
//! # Persistence rules
//!
//! - A dataset file is written before the map file that lists it
//! - Writes go through a temp file and an atomic rename
//! - A checksum mismatch on open is fatal; the catalog refuses to start

mod catalog;
mod errors;
mod persist;

pub use catalog::{is_valid_dataset_id, Catalog, CatalogSnapshot};
pub use errors::{CatalogError, CatalogErrorCode, CatalogResult, Severity};
pub use persist::{compute_checksum, DatasetFiles};
