//! Error types for the ORM system
//!
//! Configuration, driver and query-construction failures all surface as
//! [`ModelError`]. Soft conditions (empty results, unknown eager relations)
//! are never errors.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Unknown connection name or malformed configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The driver reported an error while executing a statement
    #[error("Database query error: {0}")]
    Database(String),

    /// A driver handle could not be created
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid query construction
    #[error("Query error: {0}")]
    Query(String),

    /// Invalid model input, such as a blank meta key
    #[error("Validation error: {0}")]
    Validation(String),

    /// Model not found in database
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Relationship loading failed
    #[error("Relationship error: {0}")]
    Relationship(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Transaction misuse or failure
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl ModelError {
    /// The connection name was never configured
    pub fn connection_not_configured(name: &str) -> Self {
        ModelError::Configuration(format!("Database connection [{}] not configured.", name))
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ModelError {
    fn from(err: url::ParseError) -> Self {
        ModelError::Configuration(format!("Invalid connection URL: {}", err))
    }
}
