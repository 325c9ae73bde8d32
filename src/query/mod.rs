//! Query language front end for campusdb
//!
//! A query document has the shape
//!
//! ```text
//! { WHERE: Filter, OPTIONS: { COLUMNS, ORDER? }, TRANSFORMATIONS?: { GROUP, APPLY } }
//! ```
//!
//! [`QueryValidator`] checks it and produces a [`ValidatedQuery`] bound to
//! exactly one dataset. Nothing in this module reads records.

mod ast;
mod errors;
mod key;
mod validator;

pub use ast::{
    ApplyRule, ApplyToken, Column, Comparator, Filter, GroupKey, Order, SortDirection,
    Transformations, ValidatedQuery,
};
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use key::{split_key, KeyParts};
pub use validator::QueryValidator;
