//! Error types and result aliases shared across Strata components.
//!
//! Errors are structured for programmatic handling: callers of the file
//! metadata loaders match on variants to distinguish a missing table root
//! (not an error at the load level) from a storage outage or a table
//! boundary violation.

use std::fmt;

/// The result type used throughout Strata.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Strata operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path or object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A content file resolved outside the table's declared root while
    /// location containment is required.
    #[error("location violation: {path} is outside table root {table_root}")]
    LocationViolation {
        /// The offending file path.
        path: String,
        /// The table root the file must reside under.
        table_root: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Returns true if this error is a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_helpers_build_the_expected_variants() {
        assert_eq!(Error::internal("lock poisoned").to_string(), "internal error: lock poisoned");
        assert_eq!(Error::storage("listing failed").to_string(), "storage error: listing failed");
        assert!(Error::NotFound("mem://w/t".into()).is_not_found());
        assert!(!Error::internal("lock poisoned").is_not_found());
    }

    #[test]
    fn storage_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::storage_with_source("listing failed", io);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "timed out");
    }
}
