//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::PwsafeConfig;
use crate::constants::LOG_ENV;

/// Pick the filter directive: `--verbose` wins, then `RUST_LOG`, then config.
pub fn filter_directive(verbose: bool, env_value: Option<&str>, config: &PwsafeConfig) -> String {
    if verbose {
        return "debug".to_string();
    }
    match env_value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => config.log.level.clone(),
    }
}

/// Install the stderr fmt subscriber. A second call is a no-op.
pub fn init(verbose: bool, config: &PwsafeConfig) {
    let env_value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env_value.as_deref(), config);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
