//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Safe, config or entry not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Wrong passphrase or damaged file.
    pub const AUTH_FAILED: i32 = 5;
}

/// Environment variable holding the passphrase for non-interactive use.
pub const PASSPHRASE_ENV: &str = "PWSAFE_PASSPHRASE";

/// Environment variable holding the replacement passphrase for `passwd`.
pub const NEW_PASSPHRASE_ENV: &str = "PWSAFE_NEW_PASSPHRASE";

/// Environment variable overriding the default tracing filter.
pub const LOG_ENV: &str = "RUST_LOG";
