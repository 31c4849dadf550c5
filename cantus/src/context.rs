//! Application context that holds resolved configuration
//!
//! The configuration file is chosen in this order:
//! 1. `--config` flag (or `CANTUS_CONFIG`)
//! 2. `~/.config/cantus/config.yaml`, when it exists
//! 3. none, defaults only
//!
//! `CANTUS__*` environment variables are applied on top by the library.
//! Once built, the context is passed as read-only throughout the application.

use crate::format::OutputFormat;
use libcantus::{Cantus, Config};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// File the configuration was read from, if any
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn build(config_flag: Option<&Path>, format: OutputFormat) -> Result<Self, String> {
        let config_path = resolve_config_path(config_flag, default_config_path());
        let config = Config::load(config_path.as_deref()).map_err(|e| e.to_string())?;
        debug!("Loaded configuration from {:?}", config_path);

        Ok(Self {
            config,
            config_path,
            format,
        })
    }

    /// Creates the gateway. Must be called inside the tokio runtime.
    pub fn cantus(&self) -> Result<Cantus, String> {
        Cantus::new(self.config.clone()).map_err(|e| e.to_string())
    }
}

/// `~/.config/cantus/config.yaml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cantus").join("config.yaml"))
}

/// An explicit path always wins and must exist; the default is only used when present.
fn resolve_config_path(flag: Option<&Path>, default: Option<PathBuf>) -> Option<PathBuf> {
    match flag {
        Some(path) => Some(path.to_path_buf()),
        None => default.filter(|p| p.exists()),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
