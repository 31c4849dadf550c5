//! Manifest envelopes and normalization.
//!
//! A registry serves either a schema 2 manifest, whose build metadata lives in
//! a separate config blob, or a legacy schema 1 manifest, which embeds the
//! same metadata as a JSON string in `history[0].v1Compatibility`. Both are
//! read into one [`ImageConfigDocument`] and normalized by the same code, so
//! the resulting [`NormalizedManifest`] has the same shape for both.

use crate::digest::Digest;
use crate::error::{CantusError, Result};
use crate::reference::RepoCommand;
use crate::registry::Registry;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use oci_spec::image::ImageManifest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

#[cfg(test)]
mod tests;

pub const MEDIA_TYPE_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const MEDIA_TYPE_V1_SIGNED: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws";
pub const MEDIA_TYPE_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// `Accept` header for manifest requests, schema 2 preferred.
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.v1+prettyjws;q=0.9, \
     application/vnd.docker.distribution.manifest.v1+json;q=0.8";

const ENV_WHITELIST: [&str; 8] = [
    "AURORA_VERSION",
    "IMAGE_BUILD_TIME",
    "APP_VERSION",
    "JOLOKIA_VERSION",
    "JAVA_VERSION_MAJOR",
    "JAVA_VERSION_MINOR",
    "JAVA_VERSION_BUILD",
    "NODEJS_VERSION",
];

/// Manifest schema, decided from the response `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ManifestSchema {
    V2,
    V1,
}

impl ManifestSchema {
    /// Maps a `Content-Type` value (parameters ignored) to a schema.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let media_type = content_type.split(';').next().unwrap_or("").trim();
        match media_type {
            MEDIA_TYPE_V2 => Some(Self::V2),
            MEDIA_TYPE_V1_SIGNED | MEDIA_TYPE_V1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Schema 1 manifest, only the parts we read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaV1Manifest {
    #[serde(default)]
    pub fs_layers: Vec<FsLayer>,
    #[serde(default)]
    pub history: Vec<V1History>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsLayer {
    pub blob_sum: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1History {
    pub v1_compatibility: String,
}

/// Parsed manifest body.
#[derive(Debug, Clone)]
pub enum Manifest {
    V2(Box<ImageManifest>),
    V1(SchemaV1Manifest),
}

/// A manifest as served by a registry.
///
/// `raw` holds the exact bytes received. Those bytes, not a re-serialization
/// of the parsed body, are what a copy pushes, so the manifest digest is
/// preserved across registries.
#[derive(Debug, Clone)]
pub struct ManifestEnvelope {
    pub content_type: String,
    pub content_digest: String,
    pub manifest: Manifest,
    pub raw: Bytes,
}

impl ManifestEnvelope {
    /// Parses a manifest response.
    ///
    /// An unsupported content type is a terminal `SourceSystem` error; a body
    /// that does not parse as the announced schema is a `ProtocolViolation`.
    pub fn parse(
        registry: &str,
        content_type: &str,
        content_digest: &str,
        raw: Bytes,
    ) -> Result<Self> {
        let schema = ManifestSchema::from_content_type(content_type).ok_or_else(|| {
            CantusError::source_system(
                registry,
                format!("Unsupported manifest media type {}", content_type),
            )
        })?;

        let manifest = match schema {
            ManifestSchema::V2 => serde_json::from_slice::<ImageManifest>(&raw)
                .map(|m| Manifest::V2(Box::new(m))),
            ManifestSchema::V1 => serde_json::from_slice::<SchemaV1Manifest>(&raw).map(Manifest::V1),
        }
        .map_err(|e| {
            CantusError::protocol_violation(
                registry,
                format!("Manifest body does not match {:?}: {}", schema, e),
            )
        })?;

        Ok(Self {
            content_type: content_type.to_string(),
            content_digest: content_digest.to_string(),
            manifest,
            raw,
        })
    }

    pub fn schema(&self) -> ManifestSchema {
        match self.manifest {
            Manifest::V2(_) => ManifestSchema::V2,
            Manifest::V1(_) => ManifestSchema::V1,
        }
    }

    /// Every blob the manifest references, first occurrence order, no duplicates.
    ///
    /// Schema 2 yields the layers followed by the config blob; schema 1 yields
    /// its `fsLayers`.
    pub fn blob_digests(&self, registry: &str) -> Result<Vec<Digest>> {
        let all: Vec<Digest> = match &self.manifest {
            Manifest::V2(m) => m
                .layers()
                .iter()
                .map(|l| Digest::from(l.digest().clone()))
                .chain(std::iter::once(Digest::from(m.config().digest().clone())))
                .collect(),
            Manifest::V1(m) => m
                .fs_layers
                .iter()
                .map(|l| {
                    Digest::from_str(&l.blob_sum).map_err(|_| {
                        CantusError::protocol_violation(
                            registry,
                            format!("Invalid blobSum {} in manifest", l.blob_sum),
                        )
                    })
                })
                .collect::<Result<_>>()?,
        };

        let mut unique: Vec<Digest> = Vec::with_capacity(all.len());
        for digest in all {
            if !unique.contains(&digest) {
                unique.push(digest);
            }
        }
        Ok(unique)
    }
}

/// Build metadata shared by schema 2 config blobs and schema 1
/// `v1Compatibility` documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageConfigDocument {
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub docker_version: Option<String>,
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerConfig {
    #[serde(rename = "Env", default)]
    pub env: Option<Vec<String>>,
}

impl ImageConfigDocument {
    /// Whitelisted `Env` entries, keys upper-cased.
    fn whitelisted_env(&self) -> HashMap<String, String> {
        self.config
            .as_ref()
            .and_then(|c| c.env.as_ref())
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.split_once('='))
            .map(|(k, v)| (k.to_uppercase(), v.to_string()))
            .filter(|(k, _)| ENV_WHITELIST.contains(&k.as_str()))
            .collect()
    }
}

/// Java runtime versions baked into an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaImage {
    pub major: String,
    pub minor: String,
    pub build: String,
    pub jolokia: Option<String>,
}

/// Normalized image metadata, identical in shape for both schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedManifest {
    pub docker_digest: String,
    pub docker_version: String,
    /// `created` from the config document
    pub build_ended: String,
    /// `IMAGE_BUILD_TIME` from the image environment
    pub build_started: Option<String>,
    pub aurora_version: Option<String>,
    pub app_version: Option<String>,
    pub node_version: Option<String>,
    pub java: Option<JavaImage>,
}

/// Parsed build timestamps. Values that are not RFC 3339 become `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTimeline {
    pub build_started: Option<DateTime<Utc>>,
    pub build_ended: Option<DateTime<Utc>>,
}

impl NormalizedManifest {
    pub fn timeline(&self) -> BuildTimeline {
        BuildTimeline {
            build_started: self.build_started.as_deref().and_then(parse_instant),
            build_ended: parse_instant(&self.build_ended),
        }
    }

    /// Builds the normalized view from a config document.
    ///
    /// `docker_version` and `created` are required.
    pub fn from_config(
        registry: &str,
        docker_digest: &str,
        config: &ImageConfigDocument,
    ) -> Result<Self> {
        let docker_version = config.docker_version.clone().ok_or_else(|| {
            CantusError::source_system(registry, "Image config is missing docker_version")
        })?;
        let build_ended = config.created.clone().ok_or_else(|| {
            CantusError::source_system(registry, "Image config is missing created")
        })?;

        let mut env = config.whitelisted_env();

        let java = match (
            env.remove("JAVA_VERSION_MAJOR"),
            env.remove("JAVA_VERSION_MINOR"),
            env.remove("JAVA_VERSION_BUILD"),
        ) {
            (Some(major), Some(minor), Some(build)) => Some(JavaImage {
                major,
                minor,
                build,
                jolokia: env.remove("JOLOKIA_VERSION"),
            }),
            _ => None,
        };

        Ok(Self {
            docker_digest: docker_digest.to_string(),
            docker_version,
            build_ended,
            build_started: env.remove("IMAGE_BUILD_TIME"),
            aurora_version: env.remove("AURORA_VERSION"),
            app_version: env.remove("APP_VERSION"),
            node_version: env.remove("NODEJS_VERSION"),
            java,
        })
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Reads the config document embedded in a schema 1 manifest.
pub fn v1_config(registry: &str, manifest: &SchemaV1Manifest) -> Result<ImageConfigDocument> {
    let first = manifest.history.first().ok_or_else(|| {
        CantusError::protocol_violation(registry, "Schema 1 manifest has no history")
    })?;

    serde_json::from_str(&first.v1_compatibility).map_err(|e| {
        CantusError::protocol_violation(
            registry,
            format!("history[0].v1Compatibility is not a valid document: {}", e),
        )
    })
}

/// Normalizes a fetched manifest.
///
/// Schema 2 fetches the config blob through `registry`; schema 1 needs no
/// further request.
pub async fn normalize(
    registry: &Registry,
    cmd: &RepoCommand,
    envelope: &ManifestEnvelope,
) -> Result<NormalizedManifest> {
    let config = match &envelope.manifest {
        Manifest::V2(m) => {
            let digest = Digest::from(m.config().digest().clone());
            debug!(
                "Fetching config blob {} for {} (schema 2)",
                digest,
                cmd.manifest_path()
            );
            registry.get_config_blob(cmd, &digest).await?
        }
        Manifest::V1(m) => v1_config(cmd.registry(), m)?,
    };

    NormalizedManifest::from_config(cmd.registry(), &envelope.content_digest, &config)
}
