//! Application configuration.
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then `CANTUS__SECTION__KEY` environment variables. The resulting
//! [`Config`] is an immutable value handed to [`crate::Cantus`] at
//! construction.

use crate::auth::AuthMethod;
use crate::error::{CantusError, Result};
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub retry: Retry,
    #[serde(default)]
    pub pool: Pool,
    #[serde(default)]
    pub registries: Registries,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// Environment variables are not consulted, which keeps this usable from tests.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path, then applies `CANTUS__*`
    /// environment overrides.
    ///
    /// A path that is given must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CANTUS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("registries.internal")
                .with_list_parse_key("registries.disabled"),
        );

        Self::from_builder(builder)
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                CantusError::config_with_source(
                    "Failed to deserialize configuration",
                    None::<&str>,
                    e,
                )
            })
    }
}

/// HTTP client settings. Durations are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Idle read timeout. A body that keeps arriving is never cut off.
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            connect_timeout: default_connect_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Retry and deadline settings for every registry call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retry {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Overall deadline in seconds for one logical operation, retries included
    #[serde(default = "default_deadline")]
    pub deadline: u64,
}

impl Retry {
    pub fn min_backoff(&self) -> Duration {
        Duration::from_millis(self.min_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline)
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_backoff_ms: default_min_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            deadline: default_deadline(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    1000
}

fn default_deadline() -> u64 {
    300
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pool {
    #[serde(default = "default_pool_workers")]
    pub workers: usize,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            workers: default_pool_workers(),
        }
    }
}

fn default_pool_workers() -> usize {
    8
}

/// Which registries are reachable and how they are treated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registries {
    /// Internal registries, `host` or `host:port`. Matched on host only.
    #[serde(default = "default_internal_registries")]
    pub internal: Vec<String>,

    /// Registries that are never contacted
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Whether registries outside `internal` may be used at all
    #[serde(default = "default_allow_external")]
    pub allow_external: bool,

    /// Per-registry authentication, replacing the internal/external default
    #[serde(default)]
    pub auth: Vec<RegistryAuth>,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            internal: default_internal_registries(),
            disabled: Vec::new(),
            allow_external: default_allow_external(),
            auth: Vec::new(),
        }
    }
}

/// Authentication for one registry, matched on host like `internal`.
///
/// ```yaml
/// registries:
///   auth:
///     - registry: nexus.example.com
///       method: basic
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryAuth {
    pub registry: String,
    pub method: AuthMethod,
}

fn default_internal_registries() -> Vec<String> {
    vec!["docker-registry.default.svc:5000".to_string()]
}

fn default_allow_external() -> bool {
    true
}
