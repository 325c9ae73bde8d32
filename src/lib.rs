//! campusdb - A strict, deterministic query engine over campus datasets
//!
//! Course-section and room datasets are registered in a [`catalog`] and
//! queried with a JSON query language: WHERE filters, GROUP/APPLY
//! aggregation, multi-key ORDER and COLUMNS projection.

pub mod catalog;
pub mod cli;
pub mod dataset;
pub mod executor;
pub mod http_server;
pub mod observability;
pub mod query;
