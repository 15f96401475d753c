use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default tracing filter when neither the config nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PwsafeConfig {
    #[serde(default)]
    pub safe: SafeSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub tracking: TrackingSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SafeSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySection {
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSection {
    #[serde(default = "enabled")]
    pub access: bool,
    #[serde(default = "enabled")]
    pub modify: bool,
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            access: true,
            modify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_iterations() -> u32 {
    pwsafe_core::storage::format::MIN_ITERATIONS
}

fn enabled() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl PwsafeConfig {
    /// Config pointing at `safe_path`, everything else default.
    pub fn with_safe_path(safe_path: &Path) -> Self {
        Self {
            safe: SafeSection {
                path: Some(safe_path.to_string_lossy().to_string()),
            },
            ..Self::default()
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_safe_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("default.psafe3"))
}

/// Read the config, or defaults when the file does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<PwsafeConfig> {
    if !path.exists() {
        return Ok(PwsafeConfig::default());
    }
    read_config(path)
}

pub fn read_config(path: &Path) -> anyhow::Result<PwsafeConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &PwsafeConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("pwsafe"));
        }
    }
    Ok(home_dir()?.join(".config").join("pwsafe"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("pwsafe"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("pwsafe"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = PwsafeConfig::with_safe_path(Path::new("/tmp/personal.psafe3"));
        config.security.iterations = 100_000;
        config.tracking.access = false;
        config.log.level = "debug".to_string();

        write_config(&path, &config).unwrap();
        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_means_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, PwsafeConfig::default());
        assert_eq!(config.security.iterations, 2048);
        assert!(config.tracking.access);
        assert!(config.tracking.modify);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tracking]\nmodify = false\n").unwrap();

        let config = read_config(&path).unwrap();
        assert!(config.safe.path.is_none());
        assert!(config.tracking.access);
        assert!(!config.tracking.modify);
        assert_eq!(config.security.iterations, 2048);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[security]\niterations = \"many\"\n").unwrap();

        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
