use super::*;
use crate::config::Registries;
use crate::metadata::Scheme;

fn assembler() -> RepoCommandAssembler {
    RepoCommandAssembler::new(RegistryMetadataResolver::new(&Registries {
        internal: vec!["docker-registry.default.svc:5000".to_string()],
        disabled: vec!["blocked.example.com".to_string()],
        allow_external: true,
        auth: vec![],
    }))
}

#[test]
fn test_assemble_name_and_tag_fused() {
    let cmd = assembler()
        .assemble("docker.io/no_skatteetaten_aurora_demo/whoami:2", None)
        .unwrap();

    assert_eq!(cmd.registry(), "docker.io");
    assert_eq!(cmd.group(), "no_skatteetaten_aurora_demo");
    assert_eq!(cmd.name(), "whoami");
    assert_eq!(cmd.tag(), Some("2"));
}

#[test]
fn test_assemble_four_segments() {
    let cmd = assembler()
        .assemble("docker.io/group/name/1.2.3", None)
        .unwrap();

    assert_eq!(cmd.tag(), Some("1.2.3"));
    assert_eq!(cmd.manifest_path(), "group/name/1.2.3");
}

#[test]
fn test_assemble_without_tag() {
    let cmd = assembler().assemble("docker.io/group/name", None).unwrap();

    assert_eq!(cmd.tag(), None);
    assert_eq!(cmd.repo_path(), "group/name");
    assert_eq!(cmd.manifest_path(), "group/name");
    assert!(cmd.require_tag("manifest lookup").is_err());
}

#[test]
fn test_round_trip_reproduces_segments() {
    let cases = [
        "docker-registry.default.svc:5000/no_skatteetaten/whoami:1.0.0",
        "docker.io/library/alpine:latest",
        "127.0.0.1:5000/group/name:SNAPSHOT-feature-X-20180102.092832-15-b1.5.5",
    ];

    for reference in cases {
        let cmd = assembler().assemble(reference, Some("token")).unwrap();
        let (repo, tag) = reference.rsplit_once(':').unwrap();

        assert_eq!(cmd.qualified_repo(), repo);
        assert_eq!(
            cmd.manifest_path(),
            format!("{}/{}", repo.split_once('/').unwrap().1, tag)
        );
        assert_eq!(cmd.to_string(), reference);
    }
}

#[test]
fn test_malformed_references() {
    let cases = [
        "no_skatteetaten_aurora_demo/whaomi",
        "docker.com/group",
        "a/b/c/d/e",
        "",
        "docker.io//name:tag",
        "docker.io/group/name:",
        "docker.io/group/:tag",
        "docker.io/group/name:x/1.0",
    ];

    for reference in cases {
        match assembler().assemble(reference, None) {
            Err(CantusError::MalformedReference { reference: r, .. }) => {
                assert_eq!(r, reference)
            }
            other => panic!("expected MalformedReference for {:?}, got {:?}", reference, other),
        }
    }
}

#[test]
fn test_internal_registry_requires_credential() {
    let err = assembler()
        .assemble("docker-registry.default.svc:5000/group/name:1", None)
        .unwrap_err();
    assert!(matches!(err, CantusError::AuthRequired { .. }));

    let err = assembler()
        .assemble("docker-registry.default.svc:5000/group/name:1", Some("  "))
        .unwrap_err();
    assert!(matches!(err, CantusError::AuthRequired { .. }));

    let err = assembler()
        .assemble("docker-registry.default.svc:5000/group/name:1", Some("Bearer "))
        .unwrap_err();
    assert!(matches!(err, CantusError::AuthRequired { .. }));
}

#[test]
fn test_internal_registry_with_header_style_credential() {
    let cmd = assembler()
        .assemble(
            "docker-registry.default.svc:5000/group/name:1",
            Some("Bearer abc"),
        )
        .unwrap();

    assert_eq!(cmd.policy().scheme, Scheme::Http);
    assert_eq!(cmd.base_url(), "http://docker-registry.default.svc:5000/v2");
    assert_eq!(cmd.authorization(), Some("Bearer abc".to_string()));
}

#[test]
fn test_external_registry_sends_no_authorization() {
    let cmd = assembler()
        .assemble("docker.io/library/alpine:3", Some("abc"))
        .unwrap();

    assert_eq!(cmd.auth_method(), AuthMethod::None);
    assert_eq!(cmd.authorization(), None);
}

#[test]
fn test_disabled_registry_is_malformed_reference() {
    let err = assembler()
        .assemble("blocked.example.com/group/name:1", None)
        .unwrap_err();

    match err {
        CantusError::MalformedReference { message, .. } => {
            assert!(message.contains("unknown registry"));
        }
        other => panic!("expected MalformedReference, got {:?}", other),
    }
}
