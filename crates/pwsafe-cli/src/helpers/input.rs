//! Passphrase and secret prompts.

use dialoguer::Password;
use zeroize::Zeroizing;

use crate::constants::{NEW_PASSPHRASE_ENV, PASSPHRASE_ENV};

fn secret_from_env(name: &str) -> Option<Zeroizing<String>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(Zeroizing::new(value)),
        _ => None,
    }
}

fn no_tty(name: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No passphrase provided and no TTY available. Set {}.",
        name
    )
}

fn prompt_confirmed(prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for the safe passphrase, or read it from PWSAFE_PASSPHRASE.
pub fn prompt_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = secret_from_env(PASSPHRASE_ENV) {
        return Ok(value);
    }
    if !interactive {
        return Err(no_tty(PASSPHRASE_ENV));
    }
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a new safe passphrase with confirmation, or read PWSAFE_PASSPHRASE.
pub fn prompt_init_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = secret_from_env(PASSPHRASE_ENV) {
        return Ok(value);
    }
    if !interactive {
        return Err(no_tty(PASSPHRASE_ENV));
    }
    prompt_confirmed("Enter passphrase")
}

/// Prompt for the replacement passphrase, or read PWSAFE_NEW_PASSPHRASE.
pub fn prompt_new_passphrase(interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(value) = secret_from_env(NEW_PASSPHRASE_ENV) {
        return Ok(value);
    }
    if !interactive {
        return Err(no_tty(NEW_PASSPHRASE_ENV));
    }
    prompt_confirmed("New passphrase")
}

/// Prompt for an entry secret. Empty is allowed.
pub fn prompt_secret(prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map(Zeroizing::new)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", prompt.to_lowercase(), e))
}
