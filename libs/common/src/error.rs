//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[from] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// True when a UNIQUE constraint rejected the write
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(err)) => err.is_unique_violation(),
            _ => false,
        }
    }

    /// True when a FOREIGN KEY constraint rejected the write
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(err)) => err.is_foreign_key_violation(),
            _ => false,
        }
    }

    /// Message reported by the database driver, if the error came from it
    pub fn driver_message(&self) -> Option<&str> {
        match self {
            DatabaseError::Query(SqlxError::Database(err)) => Some(err.message()),
            _ => None,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_query_errors_are_not_constraint_violations() {
        let err = DatabaseError::Configuration("bad url".to_string());
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());

        let err = DatabaseError::Query(SqlxError::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(err.driver_message().is_none());
    }
}
