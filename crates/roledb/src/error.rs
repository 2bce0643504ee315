//! Error types for roledb

use thiserror::Error;

/// Result type alias for roledb operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for role-scoped database access.
///
/// None of these are retried by the library. Each one is returned to the
/// immediate caller, which decides whether to abort or continue.
#[derive(Debug, Error)]
pub enum DbError {
    /// Role not registered, duplicate registration or unusable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record type tagging defect (missing, invalid or duplicate column tags)
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Statement could not be assembled (placeholder/parameter mismatch, bad pagination)
    #[error("Build error: {0}")]
    Build(String),

    /// Raw SQL matched the denylist and was not executed
    #[error("Unsafe query rejected: matched pattern '{pattern}'")]
    UnsafeQuery { pattern: String },

    /// The store rejected or failed the statement
    #[error("Execution error: {0}")]
    Execution(#[from] tokio_postgres::Error),

    /// Pool exhausted or connection unavailable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl DbError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a mapping error
    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping(message.into())
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create an unsafe-query error naming the matched pattern
    pub fn unsafe_query(pattern: impl Into<String>) -> Self {
        Self::UnsafeQuery {
            pattern: pattern.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a build error
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is an unsafe-query rejection
    pub fn is_unsafe_query(&self) -> bool {
        matches!(self, Self::UnsafeQuery { .. })
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The SQLSTATE code of the underlying store error, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}

impl From<deadpool_postgres::BuildError> for DbError {
    fn from(err: deadpool_postgres::BuildError) -> Self {
        Self::Configuration(err.to_string())
    }
}
