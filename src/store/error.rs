//! Data service error types
//!
//! Defines all errors that can occur behind a `DataService`, local or remote.

use thiserror::Error;

/// Errors that can occur in the data store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite statement failed
    #[error("Database error: {0}")]
    Database(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested row does not exist
    #[error("{table} row not found: {id}")]
    NotFound { table: &'static str, id: String },

    /// A stored row could not be decoded
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// A remote server could not be reached
    #[error("Cannot reach the Safar API: {0}")]
    Unreachable(String),

    /// A remote server rejected the request
    #[error("Request failed ({status}): {message}")]
    Remote { status: u16, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::NotFound {
            table: "articles",
            id: "a1".to_string(),
        };
        assert_eq!(err.to_string(), "articles row not found: a1");

        let err = StoreError::InvalidRecord("bad timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid record: bad timestamp");

        let err = StoreError::Remote {
            status: 401,
            message: "Unauthorized: Invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed (401): Unauthorized: Invalid token");
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
