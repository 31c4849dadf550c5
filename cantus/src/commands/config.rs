//! `cantus config`: the configuration commands run with, and its source.

use crate::context::AppContext;
use crate::format::{self, OutputFormat};
use libcantus::Config;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct EffectiveConfig<'a> {
    /// File the values were read from; `None` means defaults only
    pub source: Option<&'a Path>,
    pub config: &'a Config,
}

impl<'a> EffectiveConfig<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            source: ctx.config_path.as_deref(),
            config: &ctx.config,
        }
    }
}

/// Source line followed by the configuration as YAML.
pub fn describe(effective: &EffectiveConfig<'_>) -> String {
    let source = match effective.source {
        Some(path) => format!("# Read from {}", path.display()),
        None => "# No config file, built-in defaults".to_string(),
    };
    match serde_yaml::to_string(effective.config) {
        Ok(yaml) => format!(
            "{}\n# CANTUS__* environment variables applied\n{}",
            source,
            yaml.trim_end()
        ),
        Err(e) => format!("{}\n# Failed to serialize configuration: {}", source, e),
    }
}

pub fn render_config(ctx: &AppContext, format: OutputFormat) -> Result<String, String> {
    format::render(&EffectiveConfig::new(ctx), format, describe)
}

pub fn handle_config(ctx: &AppContext) -> Result<(), String> {
    println!("{}", render_config(ctx, ctx.format)?);
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
