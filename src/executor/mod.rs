//! Query executor subsystem for campusdb
//!
//! The executor consumes a validated query and produces deterministic rows.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the query and bind it to one dataset
//! 2. Filter records according to WHERE
//! 3. Group and aggregate (if TRANSFORMATIONS is present)
//! 4. Reject results above the row ceiling
//! 5. Apply ORDER (if specified)
//! 6. Project to COLUMNS
//!
//! # Guarantees
//!
//! - Deterministic execution
//! - Stable ordering; ties keep scan or group order
//! - Fail loudly on oversized results instead of truncating

mod aggregate;
mod errors;
mod executor;
mod filters;
mod result;
mod sorter;
mod wildcard;

pub use aggregate::{aggregate, group_and_apply};
pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use executor::{evaluate, CatalogLookup, QueryExecutor, RESULT_LIMIT};
pub use filters::{intersect, subtract, union, FilterEvaluator, MatchSet};
pub use result::{QueryOutput, Row};
pub use sorter::RowSorter;
pub use wildcard::Wildcard;
