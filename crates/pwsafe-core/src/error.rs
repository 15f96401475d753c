//! Error types for Password Safe core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

use crate::field::DataType;

/// Result type alias for Password Safe operations.
pub type Result<T> = std::result::Result<T, PwsafeError>;

/// Core error type for Password Safe operations.
#[derive(Debug, Error)]
pub enum PwsafeError {
    /// Bad magic, truncated buffer, malformed field stream or unsupported version
    #[error("Format error: {0}")]
    Format(String),

    /// Wrong passphrase or tampered file.
    ///
    /// Both causes share this variant and its message so that a caller
    /// cannot use the error as an oracle.
    #[error("Format error: password mismatch or authentication failure")]
    Authentication,

    /// Precondition violation on an argument (length, range, position)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Typed accessor applied to a field holding another kind of data
    #[error("Field type mismatch: expected {expected:?}, found {actual:?}")]
    FieldTypeMismatch { expected: DataType, actual: DataType },

    /// Mutation attempted on a read-only document
    #[error("Document is read-only")]
    ReadOnly,

    /// Save requested but no passphrase is available
    #[error("Missing passphrase")]
    MissingPassphrase,

    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PwsafeError {
    /// Returns true for every failure that surfaces as a file-format problem,
    /// including the merged passphrase/authentication failure.
    pub fn is_format_error(&self) -> bool {
        matches!(self, PwsafeError::Format(_) | PwsafeError::Authentication)
    }
}

impl From<std::io::Error> for PwsafeError {
    fn from(err: std::io::Error) -> Self {
        PwsafeError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_is_format_error() {
        assert!(PwsafeError::Authentication.is_format_error());
        assert!(PwsafeError::Format("bad magic".to_string()).is_format_error());
        assert!(!PwsafeError::ReadOnly.is_format_error());
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: PwsafeError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, PwsafeError::Storage(_)));
    }
}
