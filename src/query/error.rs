//! Query error types

use thiserror::Error;

/// Errors that can occur while building or parsing queries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Query text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Range start is not a relative duration like `-1h`
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    /// Operator symbol not in the operator table
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
