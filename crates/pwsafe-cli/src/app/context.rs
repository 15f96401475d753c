//! Application context for the pwsafe CLI.
//!
//! Bundles the parsed flags with the loaded config so handlers take one
//! parameter.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use pwsafe_core::Document;
use tracing::debug;

use crate::cli::Cli;
use crate::config::PwsafeConfig;
use crate::errors::{classify, CliError};
use crate::helpers::prompt_passphrase;

use super::resolver::{missing_safe_message, resolve_safe_path};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: PwsafeConfig,
    config_path: PathBuf,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli, config: PwsafeConfig, config_path: PathBuf) -> Self {
        Self {
            cli,
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &PwsafeConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts can be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    pub fn safe_path(&self) -> anyhow::Result<PathBuf> {
        resolve_safe_path(self.cli.safe.as_deref(), &self.config)
    }

    /// Apply the configured tracking switches and iteration floor.
    pub fn configure(&self, document: &mut Document) -> anyhow::Result<()> {
        document.set_track_access(self.config.tracking.access);
        document.set_track_modify(self.config.tracking.modify);
        if self.config.security.iterations > document.iterations() {
            document
                .set_iterations(self.config.security.iterations)
                .map_err(classify)?;
        }
        Ok(())
    }

    /// Prompt for the passphrase and open the safe.
    pub fn open_document(&self) -> anyhow::Result<(Document, PathBuf)> {
        let path = self.safe_path()?;
        if !path.exists() {
            return Err(CliError::not_found(
                format!("Safe not found: {}", path.display()),
                missing_safe_message(&path),
            )
            .into());
        }
        let passphrase = prompt_passphrase(self.interactive())?;
        let mut document = Document::open(&path, &passphrase).map_err(classify)?;
        debug!(entries = document.entries().len(), "safe opened");
        self.configure(&mut document)?;
        Ok((document, path))
    }

    /// Write the document back when anything changed.
    pub fn save_document(&self, document: &mut Document, path: &Path) -> anyhow::Result<()> {
        if !document.has_changed() {
            debug!("no changes to save");
            return Ok(());
        }
        document.save_to_path(path).map_err(classify)?;
        Ok(())
    }
}
