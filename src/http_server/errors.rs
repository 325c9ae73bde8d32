//! # HTTP API Errors
//!
//! Maps engine and catalog failures onto status codes and the
//! `{"error": "..."}` response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogErrorCode};
use crate::executor::ExecutorError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Body is not JSON or not the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Path names an unknown dataset kind
    #[error("Invalid dataset kind: {0}")]
    InvalidKind(String),

    /// Query failed validation or exceeded the result ceiling
    #[error("{}", .0.message())]
    Query(#[from] ExecutorError),

    #[error("{}", .0.message())]
    Catalog(#[from] CatalogError),

    // ==================
    // Server Errors (5xx)
    // ==================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidKind(_) => StatusCode::BAD_REQUEST,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(err) => match err.code() {
                CatalogErrorCode::CampusDatasetNotFound => StatusCode::NOT_FOUND,
                CatalogErrorCode::CampusStorageIo | CatalogErrorCode::CampusDataCorruption => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
