//! Rendering of command results.
//!
//! Results go to stdout: a table or key/value block for `pretty`, a document
//! for `json` and `yaml`. Status lines and per-reference failures go to
//! stderr, so piped JSON stays parseable even when a batch partly fails.

use libcantus::BatchFailure;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;
use tabled::{Table, Tabled, settings::Style};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!(
                "unknown format '{}', expected pretty, json or yaml",
                other
            )),
        }
    }
}

/// Outcome shown in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Partial,
    Failed,
}

impl Status {
    fn marker(self) -> &'static str {
        match self {
            Self::Done => "✓",
            Self::Partial => "⚠",
            Self::Failed => "✗",
        }
    }

    pub fn line(self, message: &str, color: bool) -> String {
        let marker = self.marker();
        if !color {
            return format!("{} {}", marker, message);
        }
        let marker = match self {
            Self::Done => marker.green().bold().to_string(),
            Self::Partial => marker.yellow().bold().to_string(),
            Self::Failed => marker.red().bold().to_string(),
        };
        format!("{} {}", marker, message)
    }
}

/// Color only on a terminal, and never with `NO_COLOR` set.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal()
}

pub fn status(status: Status, message: &str) {
    eprintln!("{}", status.line(message, use_color()));
}

/// Serializes `value` for `json`/`yaml`, or hands it to `pretty`.
pub fn render<T, F>(value: &T, format: OutputFormat, pretty: F) -> Result<String, String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Pretty => Ok(pretty(value)),
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}

/// Borderless table, one row per item. No rows, no header.
pub fn table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::empty()).to_string()
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "REFERENCE")]
    reference: String,
    #[tabled(rename = "KIND")]
    kind: &'static str,
    #[tabled(rename = "ERROR")]
    error: String,
}

/// The failed references of a batch, one row each.
pub fn failure_table(failures: &[BatchFailure]) -> String {
    let rows: Vec<_> = failures
        .iter()
        .map(|f| FailureRow {
            reference: f.reference.clone(),
            kind: f.error.kind().as_str(),
            error: f.error.to_string(),
        })
        .collect();
    table(&rows)
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
