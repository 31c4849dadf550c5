use super::*;
use crate::client::Client;
use crate::pool::WorkerPool;
use crate::retry::RetryPolicy;
use crate::test_support::{CONFIG_JSON, command, digest_of, manifest_v1, manifest_v2};

fn envelope(content_type: &str, body: String) -> ManifestEnvelope {
    ManifestEnvelope::parse("registry", content_type, "sha256:manifest", Bytes::from(body)).unwrap()
}

fn config(json: &str) -> ImageConfigDocument {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_schema_from_content_type() {
    assert_eq!(
        ManifestSchema::from_content_type(MEDIA_TYPE_V2),
        Some(ManifestSchema::V2)
    );
    assert_eq!(
        ManifestSchema::from_content_type(MEDIA_TYPE_V1_SIGNED),
        Some(ManifestSchema::V1)
    );
    assert_eq!(
        ManifestSchema::from_content_type("application/vnd.docker.distribution.manifest.v1+json; charset=utf-8"),
        Some(ManifestSchema::V1)
    );
    assert_eq!(
        ManifestSchema::from_content_type("application/vnd.oci.image.index.v1+json"),
        None
    );
}

#[test]
fn test_accept_prefers_v2() {
    let v2 = MANIFEST_ACCEPT.find(MEDIA_TYPE_V2).unwrap();
    let v1 = MANIFEST_ACCEPT.find(MEDIA_TYPE_V1_SIGNED).unwrap();
    assert!(v2 < v1);
    assert!(MANIFEST_ACCEPT.contains(MEDIA_TYPE_V1));
}

#[test]
fn test_parse_rejects_body_not_matching_schema() {
    let err = ManifestEnvelope::parse(
        "registry",
        MEDIA_TYPE_V2,
        "sha256:manifest",
        Bytes::from_static(b"not json"),
    )
    .unwrap_err();
    assert!(matches!(err, CantusError::ProtocolViolation { .. }));
}

#[test]
fn test_from_config_extracts_whitelisted_env() {
    let manifest =
        NormalizedManifest::from_config("registry", "sha256:manifest", &config(CONFIG_JSON)).unwrap();

    assert_eq!(manifest.docker_digest, "sha256:manifest");
    assert_eq!(manifest.docker_version, "17.09.1-ce");
    assert_eq!(manifest.build_ended, "2018-03-08T08:47:39.137497467Z");
    assert_eq!(manifest.build_started.as_deref(), Some("2018-03-08T08:47:22Z"));
    assert_eq!(
        manifest.aurora_version.as_deref(),
        Some("2.0.0-b1.11.0-flange-8.152.18")
    );
    assert_eq!(manifest.app_version.as_deref(), Some("2.0.0"));
    // Keys are upper-cased before the whitelist is applied
    assert_eq!(manifest.node_version.as_deref(), Some("v8.9.4"));
    assert_eq!(
        manifest.java,
        Some(JavaImage {
            major: "8".to_string(),
            minor: "0".to_string(),
            build: "152".to_string(),
            jolokia: Some("1.3.7".to_string()),
        })
    );
}

#[test]
fn test_from_config_optional_fields_absent() {
    let doc = config(
        r#"{"created":"2018-01-01T00:00:00Z","docker_version":"1.13.1","config":{"Env":["PATH=/bin","JAVA_VERSION_MAJOR=8"]}}"#,
    );
    let manifest = NormalizedManifest::from_config("registry", "sha256:m", &doc).unwrap();

    assert_eq!(manifest.aurora_version, None);
    assert_eq!(manifest.build_started, None);
    assert_eq!(manifest.node_version, None);
    // Java needs major, minor and build
    assert_eq!(manifest.java, None);
}

#[test]
fn test_from_config_missing_required_fields() {
    for json in [
        r#"{"created":"2018-01-01T00:00:00Z"}"#,
        r#"{"docker_version":"1.13.1"}"#,
    ] {
        let err = NormalizedManifest::from_config("registry", "sha256:m", &config(json)).unwrap_err();
        assert!(matches!(err, CantusError::SourceSystem { .. }), "json={}", json);
    }
}

#[test]
fn test_env_without_separator_is_ignored() {
    let doc = config(
        r#"{"created":"c","docker_version":"d","config":{"Env":["APP_VERSION","AURORA_VERSION=1=2"]}}"#,
    );
    let manifest = NormalizedManifest::from_config("registry", "sha256:m", &doc).unwrap();

    assert_eq!(manifest.app_version, None);
    // Split on the first '=' only
    assert_eq!(manifest.aurora_version.as_deref(), Some("1=2"));
}

#[test]
fn test_timeline_parses_instants_leniently() {
    let manifest =
        NormalizedManifest::from_config("registry", "sha256:manifest", &config(CONFIG_JSON)).unwrap();
    let timeline = manifest.timeline();

    assert_eq!(
        timeline.build_started.unwrap().to_rfc3339(),
        "2018-03-08T08:47:22+00:00"
    );
    assert!(timeline.build_ended.is_some());

    let odd = NormalizedManifest {
        build_started: Some("yesterday".to_string()),
        ..manifest
    };
    assert_eq!(odd.timeline().build_started, None);
}

#[test]
fn test_v1_config_is_read_from_history() {
    let env = envelope(MEDIA_TYPE_V1_SIGNED, manifest_v1(&[b"layer-1"]));
    let Manifest::V1(m) = &env.manifest else {
        panic!("expected schema 1");
    };

    let doc = v1_config("registry", m).unwrap();
    assert_eq!(doc.docker_version.as_deref(), Some("17.09.1-ce"));
}

#[test]
fn test_v1_without_history_is_protocol_violation() {
    let m = SchemaV1Manifest {
        fs_layers: vec![],
        history: vec![],
    };
    let err = v1_config("registry", &m).unwrap_err();
    assert!(matches!(err, CantusError::ProtocolViolation { .. }));
}

#[test]
fn test_blob_digests_v2_layers_then_config_deduplicated() {
    let env = envelope(
        MEDIA_TYPE_V2,
        manifest_v2(CONFIG_JSON.as_bytes(), &[b"layer-1", b"layer-2", b"layer-1"]),
    );

    let digests = env.blob_digests("registry").unwrap();
    assert_eq!(
        digests,
        vec![
            digest_of(b"layer-1"),
            digest_of(b"layer-2"),
            digest_of(CONFIG_JSON.as_bytes()),
        ]
    );
}

#[test]
fn test_blob_digests_v1_fs_layers() {
    let env = envelope(MEDIA_TYPE_V1_SIGNED, manifest_v1(&[b"layer-1", b"layer-1", b"layer-2"]));

    let digests = env.blob_digests("registry").unwrap();
    assert_eq!(digests, vec![digest_of(b"layer-1"), digest_of(b"layer-2")]);
}

#[test]
fn test_blob_digests_v1_invalid_blob_sum() {
    let body = r#"{"schemaVersion":1,"fsLayers":[{"blobSum":"nope"}],"history":[]}"#;
    let env = envelope(MEDIA_TYPE_V1, body.to_string());

    let err = env.blob_digests("registry").unwrap_err();
    assert!(matches!(err, CantusError::ProtocolViolation { .. }));
}

#[test]
fn test_normalized_manifest_serializes_camel_case() {
    let manifest =
        NormalizedManifest::from_config("registry", "sha256:manifest", &config(CONFIG_JSON)).unwrap();
    let json = serde_json::to_value(&manifest).unwrap();

    assert_eq!(json["dockerDigest"], "sha256:manifest");
    assert_eq!(json["dockerVersion"], "17.09.1-ce");
    assert_eq!(json["java"]["jolokia"], "1.3.7");
}

#[tokio::test]
async fn test_normalize_v2_fetches_config_blob() {
    let mut server = mockito::Server::new_async().await;
    let config_digest = digest_of(CONFIG_JSON.as_bytes());

    let mock = server
        .mock("GET", format!("/v2/group/name/blobs/{}", config_digest).as_str())
        .with_status(200)
        .with_body(CONFIG_JSON)
        .expect(1)
        .create_async()
        .await;

    let registry = Registry::new(
        Client::new().unwrap(),
        RetryPolicy::default(),
        WorkerPool::current(2).unwrap(),
    );
    let cmd = command(&server, "group/name:1.0.0");
    let env = envelope(MEDIA_TYPE_V2, manifest_v2(CONFIG_JSON.as_bytes(), &[b"layer-1"]));

    let v2 = normalize(&registry, &cmd, &env).await.unwrap();
    mock.assert_async().await;

    let env = envelope(MEDIA_TYPE_V1_SIGNED, manifest_v1(&[b"layer-1"]));
    let v1 = normalize(&registry, &cmd, &env).await.unwrap();

    // Both schemas converge to the same shape
    assert_eq!(v1, v2);
}
