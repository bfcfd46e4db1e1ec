//! Store error types
//!
//! Errors surfaced by [`Store`](crate::Store) and [`Bucket`](crate::Bucket).
//! Lower layers keep their own enums; this one classifies them into what a
//! caller can act on.

use thiserror::Error;

use crate::query::QueryError;
use crate::schema::SchemaError;
use crate::transport::TransportError;

/// Errors that can occur in store and bucket operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Host unreachable, request timed out, or credentials/organization rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query results name a record type that was never registered
    #[error("Record type not found: {0}")]
    NotFound(String),

    /// Query results belong to a different record type than requested
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Schema error: {0}")]
    Schema(SchemaError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Store API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<SchemaError> for StoreError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::NotFound(name) => StoreError::NotFound(name),
            other => StoreError::Schema(other),
        }
    }
}

impl From<TransportError> for StoreError {
    fn from(err: TransportError) -> Self {
        if err.is_connection() {
            return StoreError::Connection(err.to_string());
        }
        match err {
            TransportError::Api { status, message } => StoreError::Api { status, message },
            TransportError::Decode(message) => StoreError::Decode(message),
            other => StoreError::Api {
                status: 0,
                message: other.to_string(),
            },
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
