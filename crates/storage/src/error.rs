//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Walkers rely on [`PermissionDenied`](Self::PermissionDenied) being kept
/// apart from everything else: a denied listing is an expected outcome, the
/// rest are faults worth reporting.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Container or object does not exist
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (S3 connections, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::BackendError(_))
    }

    /// Returns `true` if the caller's credentials cannot read the target.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::PermissionDenied("/restricted".to_string()).to_string(), "permission denied: /restricted");
        assert_eq!(ErrorKind::NotFound("bucket".to_string()).to_string(), "not found: bucket");
    }

    #[test]
    fn error_kind_denied_is_not_retryable() {
        let denied = ErrorKind::PermissionDenied("/".to_string());
        assert!(denied.is_denied());
        assert!(!denied.is_retryable());
        let network = ErrorKind::Network("connection reset".to_string());
        assert!(!network.is_denied());
        assert!(network.is_retryable());
    }
}
