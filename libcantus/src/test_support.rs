//! Fixtures shared by unit tests.

use crate::config::Registries;
use crate::digest::Digest;
use crate::metadata::RegistryMetadataResolver;
use crate::reference::{RepoCommand, RepoCommandAssembler};
use serde_json::json;

pub const TOKEN: &str = "test-token";

pub const CONFIG_JSON: &str = r#"{
  "architecture": "amd64",
  "created": "2018-03-08T08:47:39.137497467Z",
  "docker_version": "17.09.1-ce",
  "config": {
    "Env": [
      "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin",
      "AURORA_VERSION=2.0.0-b1.11.0-flange-8.152.18",
      "IMAGE_BUILD_TIME=2018-03-08T08:47:22Z",
      "APP_VERSION=2.0.0",
      "JAVA_VERSION_MAJOR=8",
      "JAVA_VERSION_MINOR=0",
      "JAVA_VERSION_BUILD=152",
      "JOLOKIA_VERSION=1.3.7",
      "nodejs_version=v8.9.4"
    ]
  }
}"#;

pub fn assembler() -> RepoCommandAssembler {
    RepoCommandAssembler::new(RegistryMetadataResolver::new(&Registries::default()))
}

/// A command against a mock server. `127.0.0.1:<port>` resolves as internal,
/// so requests are plain HTTP with a bearer token.
pub fn command(server: &mockito::ServerGuard, path: &str) -> RepoCommand {
    assembler()
        .assemble(&format!("{}/{}", server.host_with_port(), path), Some(TOKEN))
        .unwrap()
}

pub fn digest_of(data: &[u8]) -> Digest {
    Digest::sha256_of(data).unwrap()
}

/// Schema 2 manifest referencing `config` and `layers` by their content.
pub fn manifest_v2(config: &[u8], layers: &[&[u8]]) -> String {
    let layers: Vec<_> = layers
        .iter()
        .map(|l| {
            json!({
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": l.len(),
                "digest": digest_of(l).to_string(),
            })
        })
        .collect();

    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": config.len(),
            "digest": digest_of(config).to_string(),
        },
        "layers": layers,
    })
    .to_string()
}

/// Schema 1 manifest with `CONFIG_JSON` embedded as the first history entry.
pub fn manifest_v1(layers: &[&[u8]]) -> String {
    let fs_layers: Vec<_> = layers
        .iter()
        .map(|l| json!({ "blobSum": digest_of(l).to_string() }))
        .collect();

    json!({
        "schemaVersion": 1,
        "name": "group/name",
        "tag": "1.0.0",
        "architecture": "amd64",
        "fsLayers": fs_layers,
        "history": [ { "v1Compatibility": CONFIG_JSON } ],
    })
    .to_string()
}
