//! Application-level utilities for the pwsafe CLI.
//!
//! This module provides:
//! - Path resolution for the config file and the safe
//! - The command context (config, flags, open/save of the document)

mod context;
mod resolver;

pub use context::AppContext;
pub use resolver::resolve_config_path;
