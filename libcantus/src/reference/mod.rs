//! Image reference resolution.
//!
//! Turns `registry[:port]/group/name[:tag]` strings into validated
//! [`RepoCommand`] values, attaching the registry's policy and the caller's
//! credential. All validation happens here, before any network call.

use crate::auth::{AuthMethod, Credential};
use crate::error::{CantusError, Result};
use crate::metadata::{RegistryMetadataResolver, RegistryPolicy};
use std::fmt;

#[cfg(test)]
mod tests;

/// A resolved, validated reference to one image repository, optionally at a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCommand {
    registry: String,
    group: String,
    name: String,
    tag: Option<String>,
    credential: Option<Credential>,
    policy: RegistryPolicy,
}

impl RepoCommand {
    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn policy(&self) -> &RegistryPolicy {
        &self.policy
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.policy.auth_method
    }

    /// `group/name/tag`, or `group/name` when there is no tag.
    pub fn manifest_path(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{}/{}/{}", self.group, self.name, tag),
            None => self.repo_path(),
        }
    }

    /// `group/name`
    pub fn repo_path(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }

    /// `registry/group/name`
    pub fn qualified_repo(&self) -> String {
        format!("{}/{}/{}", self.registry, self.group, self.name)
    }

    /// `scheme://registry/v2`
    pub fn base_url(&self) -> String {
        format!("{}://{}/v2", self.policy.scheme, self.registry)
    }

    /// The `Authorization` header value for requests made with this command.
    pub fn authorization(&self) -> Option<String> {
        self.policy.auth_method.header_value(self.credential.as_ref())
    }

    /// Returns the tag, or an `InvalidRequest` error naming `operation`.
    pub fn require_tag(&self, operation: &str) -> Result<&str> {
        self.tag().ok_or_else(|| {
            CantusError::invalid_request(format!(
                "{} requires a tag, got {}",
                operation,
                self.qualified_repo()
            ))
        })
    }
}

impl fmt::Display for RepoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.qualified_repo(), tag),
            None => write!(f, "{}", self.qualified_repo()),
        }
    }
}

/// Builds [`RepoCommand`] values from reference strings.
#[derive(Debug, Clone)]
pub struct RepoCommandAssembler {
    resolver: RegistryMetadataResolver,
}

impl RepoCommandAssembler {
    pub fn new(resolver: RegistryMetadataResolver) -> Self {
        Self { resolver }
    }

    /// Parses and validates `reference`, attaching `credential`.
    ///
    /// Accepted shapes are `registry/group/name`, `registry/group/name:tag`
    /// and `registry/group/name/tag`. The credential may be a bare token or a
    /// full `Authorization` header value.
    ///
    /// # Examples
    ///
    /// ```
    /// use libcantus::config::Registries;
    /// use libcantus::metadata::RegistryMetadataResolver;
    /// use libcantus::reference::RepoCommandAssembler;
    ///
    /// let assembler = RepoCommandAssembler::new(RegistryMetadataResolver::new(&Registries::default()));
    /// let cmd = assembler.assemble("docker.io/library/alpine:3.19", None).unwrap();
    /// assert_eq!(cmd.manifest_path(), "library/alpine/3.19");
    /// assert_eq!(cmd.base_url(), "https://docker.io/v2");
    /// ```
    pub fn assemble(&self, reference: &str, credential: Option<&str>) -> Result<RepoCommand> {
        let (registry, group, name, tag) = split_reference(reference)?;

        if !self.resolver.is_allowed(registry) {
            return Err(CantusError::malformed_reference(
                reference,
                format!("unknown registry {}", registry),
            ));
        }

        let policy = self.resolver.resolve(registry);
        let credential = credential.and_then(Credential::parse);

        if policy.auth_method.requires_credential() && credential.is_none() {
            return Err(CantusError::auth_required(
                registry,
                "registry requires authentication",
            ));
        }

        Ok(RepoCommand {
            registry: registry.to_string(),
            group: group.to_string(),
            name: name.to_string(),
            tag: tag.map(str::to_string),
            credential,
            policy,
        })
    }
}

fn split_reference(reference: &str) -> Result<(&str, &str, &str, Option<&str>)> {
    let malformed = || {
        CantusError::malformed_reference(
            reference,
            "expected pattern registry[:port]/group/name[:tag]",
        )
    };

    let segments: Vec<&str> = reference.split('/').collect();
    let (registry, group, name, tag) = match segments.as_slice() {
        [registry, group, name, tag] => (*registry, *group, *name, Some(*tag)),
        [registry, group, name_tag] => match name_tag.rsplit_once(':') {
            Some((name, tag)) => (*registry, *group, name, Some(tag)),
            None => (*registry, *group, *name_tag, None),
        },
        _ => return Err(malformed()),
    };

    if registry.is_empty() || group.is_empty() || name.is_empty() || name.contains(':') {
        return Err(malformed());
    }
    if tag.is_some_and(str::is_empty) {
        return Err(malformed());
    }

    Ok((registry, group, name, tag))
}
