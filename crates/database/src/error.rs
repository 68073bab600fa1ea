//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Caller is authenticated but not allowed to act on this record
    #[error("not allowed to act on {entity} {id}")]
    Forbidden { entity: &'static str, id: String },

    /// Record exists but is in the wrong state for the operation
    #[error("{entity} {id} is {state}")]
    InvalidState {
        entity: &'static str,
        id: String,
        state: String,
    },

    /// Malformed or missing input
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
