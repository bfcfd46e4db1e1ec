//! Schema error types
//!
//! Errors raised while declaring, registering or hydrating record types.

use thiserror::Error;

use super::types::FieldKind;

/// Errors that can occur in the schema layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Record type declared without a name
    #[error("Record type name must not be empty")]
    EmptyName,

    /// Two fields share a name within one record type
    #[error("Duplicate field '{field}' in record type {record}")]
    DuplicateField { record: String, field: String },

    /// Field names starting with '_' belong to the store
    #[error("Field '{field}' in record type {record} uses a reserved name")]
    ReservedField { record: String, field: String },

    /// Tags are indexed as text
    #[error("Tag '{field}' in record type {record} must be a string, not {kind}")]
    NonStringTag {
        record: String,
        field: String,
        kind: FieldKind,
    },

    /// More than one field declared as the measurement
    #[error("Record type {0} declares more than one measurement field")]
    MultipleMeasurements(String),

    /// Points need at least one value column
    #[error("Record type {0} declares no value field")]
    NoValueField(String),

    /// A different record type is already registered under this name
    #[error("Record type {0} is already registered with a different schema")]
    Conflict(String),

    /// No record type registered under this name
    #[error("Record type not found: {0}")]
    NotFound(String),

    /// A row lacks a declared column
    #[error("Missing value for field '{field}' of record type {record}")]
    MissingValue { record: String, field: String },

    /// A raw value cannot be read as the declared kind
    #[error("Invalid value '{value}' for field '{field}', expected {kind}")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
