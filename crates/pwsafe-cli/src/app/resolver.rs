//! Path resolution for config and safe files.

use std::path::{Path, PathBuf};

use crate::config::{default_config_path, default_safe_path, PwsafeConfig};

/// Resolve the config file path: `--config` (or PWSAFE_CONFIG), then XDG.
pub fn resolve_config_path(flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// Resolve the safe path: `--safe` (or PWSAFE_PATH), then config, then XDG data.
pub fn resolve_safe_path(flag: Option<&Path>, config: &PwsafeConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = config.safe.path.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    default_safe_path()
}

/// Error message when the safe file is missing.
pub fn missing_safe_message(path: &Path) -> String {
    format!(
        "No safe found at {}\n\nRun:\n  pwsafe init\n\nOr specify a safe path:\n  PWSAFE_PATH=/path/to/personal.psafe3 pwsafe list",
        path.display()
    )
}
