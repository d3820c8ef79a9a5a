//! Error types for the ArangoDB MCP Server.
//!
//! This module defines all error types using `thiserror`, together with the
//! `ErrorKind` taxonomy used by the dispatcher when mapping failures into the
//! wire envelope. Every failure kind is recovered at the dispatch boundary;
//! only registry-population errors at startup are fatal.

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the ArangoDB HTTP client.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Database operation failed: {message}")]
    Operation {
        message: String,
        /// ArangoDB error number, e.g. 1203 for "collection not found"
        error_num: Option<i64>,
    },

    #[error("HTTP error: {message}")]
    Http { message: String },

    #[error("Unexpected response: {message}")]
    Response { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a database operation error with an optional ArangoDB error number.
    pub fn operation(message: impl Into<String>, error_num: Option<i64>) -> Self {
        Self::Operation {
            message: message.into(),
            error_num,
        }
    }

    /// Create an HTTP transport error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
        }
    }

    /// Create an unexpected-response error.
    pub fn response(message: impl Into<String>) -> Self {
        Self::Response {
            message: message.into(),
        }
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The ArangoDB error number, when the server reported one.
    pub fn error_num(&self) -> Option<i64> {
        match self {
            Self::Operation { error_num, .. } => *error_num,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            DbError::connection(err.to_string())
        } else if err.is_decode() {
            DbError::response(err.to_string())
        } else {
            DbError::http(err.to_string())
        }
    }
}

/// Result type alias for database client operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by a tool handler after its arguments validated.
///
/// The dispatcher converts these into `Failure` responses; they never
/// propagate past the dispatch boundary.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A key the handler requires was absent from already-validated
    /// arguments. Indicates a schema/handler contract mismatch.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// The underlying database rejected or failed the operation.
    #[error("Database operation failed: {0}")]
    Database(String),

    /// The handler rejected its input on domain grounds.
    #[error("{0}")]
    Invalid(String),

    /// Anything else.
    #[error("Operation failed: {0}")]
    Unexpected(String),
}

impl HandlerError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<DbError> for HandlerError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::Operation { .. } | DbError::Connection { .. } | DbError::Http { .. } => {
                HandlerError::Database(err.to_string())
            }
            DbError::Response { .. } | DbError::Internal { .. } => {
                HandlerError::Unexpected(err.to_string())
            }
        }
    }
}

/// Result type alias for tool handlers.
pub type HandlerResult = Result<serde_json::Value, HandlerError>;

/// Failure kinds surfaced in the wire envelope.
///
/// The serialized name appears as the `"type"` field of a failure payload,
/// so renaming a variant is a wire-contract change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnknownTool,
    ValidationError,
    DatabaseUnavailable,
    MissingParameter,
    DatabaseOperationFailed,
    UnexpectedError,
}

impl ErrorKind {
    /// Stable name used in the `"type"` field of failure payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "UnknownTool",
            Self::ValidationError => "ValidationError",
            Self::DatabaseUnavailable => "DatabaseUnavailable",
            Self::MissingParameter => "MissingParameter",
            Self::DatabaseOperationFailed => "DatabaseOperationFailed",
            Self::UnexpectedError => "UnexpectedError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while populating the tool registry. Fatal at startup.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    Duplicate(String),

    #[error("Tool registry is empty. No tools have been registered.")]
    Empty,
}
