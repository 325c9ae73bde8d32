//! Executor error types
//!
//! Error codes:
//! - CAMPUS_QUERY_REJECTED (REJECT)
//! - CAMPUS_RESULT_TOO_LARGE (REJECT)
//!
//! Both are terminal for the query. A rejected query carries the
//! validation error that caused it.

use std::fmt;

use crate::query::QueryError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Query failed validation, before or during evaluation
    CampusQueryRejected,
    /// Final row count exceeds the result ceiling
    CampusResultTooLarge,
}

impl ExecutorErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::CampusQueryRejected => "CAMPUS_QUERY_REJECTED",
            ExecutorErrorCode::CampusResultTooLarge => "CAMPUS_RESULT_TOO_LARGE",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    /// Validation failure behind a rejection
    cause: Option<QueryError>,
}

impl ExecutorError {
    /// Wrap a validation failure
    pub fn rejected(cause: QueryError) -> Self {
        Self {
            code: ExecutorErrorCode::CampusQueryRejected,
            message: cause.message().to_string(),
            cause: Some(cause),
        }
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, limit: usize) -> Self {
        Self {
            code: ExecutorErrorCode::CampusResultTooLarge,
            message: format!("Query produced {} rows, limit is {}", rows, limit),
            cause: None,
        }
    }

    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The validation error, for rejected queries
    pub fn query_error(&self) -> Option<&QueryError> {
        self.cause.as_ref()
    }

    pub fn is_validation(&self) -> bool {
        self.code == ExecutorErrorCode::CampusQueryRejected
    }

    pub fn is_too_large(&self) -> bool {
        self.code == ExecutorErrorCode::CampusResultTooLarge
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.code.severity(), self.code.code())?;
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", cause.code(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<QueryError> for ExecutorError {
    fn from(err: QueryError) -> Self {
        ExecutorError::rejected(err)
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
