//! # campusdb HTTP Server Module
//!
//! JSON-over-HTTP surface for the catalog and the query engine.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /metrics` - Counter snapshot
//! - `GET /datasets` - Registered datasets
//! - `PUT /dataset/:id/:kind` - Register a dataset
//! - `DELETE /dataset/:id` - Remove a dataset
//! - `POST /query` - Run a query

pub mod config;
pub mod dataset_routes;
pub mod errors;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
