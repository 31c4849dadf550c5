//! Registry metadata resolution.
//!
//! Decides, from configuration alone, how a registry is spoken to: which URL
//! scheme, which authentication method, and whether it counts as internal.
//! Resolution is pure and does no I/O.

use crate::auth::AuthMethod;
use crate::config::Registries;
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

#[cfg(test)]
mod tests;

/// URL scheme used to reach a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// How to talk to one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryPolicy {
    pub scheme: Scheme,
    pub auth_method: AuthMethod,
    pub is_internal: bool,
}

impl RegistryPolicy {
    /// Plain-HTTP, token-authenticated registry inside the cluster.
    pub fn internal() -> Self {
        Self {
            scheme: Scheme::Http,
            auth_method: AuthMethod::Bearer,
            is_internal: true,
        }
    }

    /// Public HTTPS registry with anonymous access.
    pub fn external() -> Self {
        Self {
            scheme: Scheme::Https,
            auth_method: AuthMethod::None,
            is_internal: false,
        }
    }
}

/// Resolves [`RegistryPolicy`] values from the `registries` configuration.
#[derive(Debug, Clone)]
pub struct RegistryMetadataResolver {
    internal_hosts: Vec<String>,
    disabled_hosts: Vec<String>,
    allow_external: bool,
    auth_methods: Vec<(String, AuthMethod)>,
}

impl RegistryMetadataResolver {
    pub fn new(config: &Registries) -> Self {
        Self {
            internal_hosts: config.internal.iter().map(|r| host_of(r).to_string()).collect(),
            disabled_hosts: config.disabled.iter().map(|r| host_of(r).to_string()).collect(),
            allow_external: config.allow_external,
            auth_methods: config
                .auth
                .iter()
                .map(|a| (host_of(&a.registry).to_string(), a.method))
                .collect(),
        }
    }

    /// Resolves the policy for `registry` (`host` or `host:port`).
    ///
    /// A registry is internal when its host matches a configured internal
    /// registry's host, ports ignored on both sides, or when it is an IPv4
    /// literal with an explicit port. A `registries.auth` entry for the host
    /// replaces the default authentication method.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::config::Registries;
    /// use libcantus::metadata::{RegistryMetadataResolver, Scheme};
    ///
    /// let resolver = RegistryMetadataResolver::new(&Registries::default());
    /// assert_eq!(resolver.resolve("127.0.0.1:5000").scheme, Scheme::Http);
    /// assert_eq!(resolver.resolve("docker.io").scheme, Scheme::Https);
    /// ```
    pub fn resolve(&self, registry: &str) -> RegistryPolicy {
        let mut policy = if self.is_internal(registry) {
            RegistryPolicy::internal()
        } else {
            RegistryPolicy::external()
        };

        let host = host_of(registry);
        if let Some((_, method)) = self.auth_methods.iter().find(|(h, _)| h == host) {
            policy.auth_method = *method;
        }
        policy
    }

    /// Whether `registry` may be contacted at all.
    pub fn is_allowed(&self, registry: &str) -> bool {
        let host = host_of(registry);
        if self.disabled_hosts.iter().any(|h| h == host) {
            return false;
        }
        self.allow_external || self.is_internal(registry)
    }

    fn is_internal(&self, registry: &str) -> bool {
        let host = host_of(registry);
        self.internal_hosts.iter().any(|h| h == host) || is_ipv4_with_port(registry)
    }
}

fn host_of(registry: &str) -> &str {
    match registry.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => host,
        _ => registry,
    }
}

fn is_ipv4_with_port(registry: &str) -> bool {
    match registry.rsplit_once(':') {
        Some((host, port)) => host.parse::<Ipv4Addr>().is_ok() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
