//! Dataset model for campusdb
//!
//! Datasets are flat, single-kind collections of records:
//!
//! - Sections: academic course offerings, keyed by `uuid`
//! - Rooms: bookable campus rooms, keyed by `name`
//!
//! Query keys take the form `<datasetId>_<field>`. The set of valid
//! fields for each kind is closed and lives in [`Field`].

mod errors;
mod ingest;
mod kind;
mod record;
mod store;
mod value;

pub use errors::{DatasetError, DatasetErrorCode, DatasetResult};
pub use ingest::{
    records_from_json, sections_from_course_dir, sections_from_course_document,
    OVERALL_SECTION_YEAR,
};
pub use kind::{DatasetKind, Field, ValueType};
pub use record::{Record, Room, Section};
pub use store::{Dataset, DatasetInfo, RecordStore};
pub use value::{FieldValue, Scalar};
