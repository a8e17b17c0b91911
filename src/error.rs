//! Custom error types for splitbook
//!
//! Only conditions that indicate a broken caller or a failing collaborator are
//! errors. Incomplete forms, unbalanced splits and reconciled confirmations are
//! reported as values by the session layer.

use thiserror::Error;

use crate::models::TransactionId;

/// The main error type for splitbook operations
#[derive(Error, Debug)]
pub enum SplitbookError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// A caller asked for an operation whose precondition does not hold
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A row id was used that does not belong to the edit session
    #[error("Transaction {id} is not part of this edit session")]
    NotInSession { id: TransactionId },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SplitbookError {
    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for SplitbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SplitbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for splitbook operations
pub type SplitbookResult<T> = Result<T, SplitbookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SplitbookError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = SplitbookError::transaction_not_found("abc");
        assert_eq!(err.to_string(), "Transaction not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_in_session_error() {
        let err = SplitbookError::NotInSession {
            id: TransactionId::from("missing-row"),
        };
        assert_eq!(
            err.to_string(),
            "Transaction missing-row is not part of this edit session"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SplitbookError = io_err.into();
        assert!(matches!(err, SplitbookError::Io(_)));
    }
}
