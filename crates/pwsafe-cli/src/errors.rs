//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes so scripts can tell a missing
//! safe from a wrong passphrase.

use std::fmt;

use pwsafe_core::PwsafeError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Safe, config or entry not found
    NotFound { message: String, hint: String },

    /// Wrong passphrase or damaged file
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

/// Translate an engine error, keeping unclassified ones as plain errors.
pub fn classify(err: PwsafeError) -> anyhow::Error {
    match err {
        PwsafeError::Authentication => CliError::auth_failed_with_hint(
            "Incorrect passphrase or damaged safe",
            "Check the passphrase (or PWSAFE_PASSPHRASE) and that the file is intact.",
        )
        .into(),
        PwsafeError::Format(message) => CliError::invalid_input(format!(
            "Not a readable Password Safe v3 file: {}",
            message
        ))
        .into(),
        PwsafeError::InvalidArgument(message) => CliError::invalid_input(message).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_maps_to_auth_exit_code() {
        let err = classify(PwsafeError::Authentication);
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli.exit_code(), exit_codes::AUTH_FAILED);
    }

    #[test]
    fn test_read_only_stays_unclassified() {
        let err = classify(PwsafeError::ReadOnly);
        assert!(err.downcast_ref::<CliError>().is_none());
        assert!(err.downcast_ref::<PwsafeError>().is_some());
    }

    #[test]
    fn test_not_found_display_includes_hint() {
        let err = CliError::not_found("No entry 'Mail'", "Run: pwsafe list");
        assert_eq!(err.to_string(), "No entry 'Mail'\nRun: pwsafe list");
        assert_eq!(err.exit_code(), exit_codes::NOT_FOUND);
    }
}
