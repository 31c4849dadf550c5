use super::*;
use crate::config::RegistryAuth;

fn resolver() -> RegistryMetadataResolver {
    RegistryMetadataResolver::new(&Registries {
        internal: vec!["docker-registry.default.svc:5000".to_string()],
        disabled: vec!["blocked.example.com".to_string()],
        allow_external: true,
        auth: vec![],
    })
}

#[test]
fn test_policy_table() {
    let cases = [
        ("docker-registry.default.svc:5000", RegistryPolicy::internal()),
        // Port is ignored when matching internal hosts
        ("docker-registry.default.svc", RegistryPolicy::internal()),
        ("docker-registry.default.svc:443", RegistryPolicy::internal()),
        ("127.0.0.1:5000", RegistryPolicy::internal()),
        ("10.1.2.3:8080", RegistryPolicy::internal()),
        ("127.0.0.1", RegistryPolicy::external()),
        ("docker-registry.somesuch.no:5000", RegistryPolicy::external()),
        ("docker.io", RegistryPolicy::external()),
    ];

    let resolver = resolver();
    for (registry, expected) in cases {
        assert_eq!(resolver.resolve(registry), expected, "registry={}", registry);
    }
}

#[test]
fn test_internal_policy_is_http_bearer() {
    let policy = resolver().resolve("docker-registry.default.svc:5000");
    assert_eq!(policy.scheme, Scheme::Http);
    assert_eq!(policy.auth_method, AuthMethod::Bearer);
    assert!(policy.is_internal);
}

#[test]
fn test_external_policy_is_https_anonymous() {
    let policy = resolver().resolve("docker-registry.somesuch.no:5000");
    assert_eq!(policy.scheme, Scheme::Https);
    assert_eq!(policy.auth_method, AuthMethod::None);
    assert!(!policy.is_internal);
}

#[test]
fn test_disabled_registry_is_not_allowed() {
    let resolver = resolver();
    assert!(!resolver.is_allowed("blocked.example.com"));
    assert!(!resolver.is_allowed("blocked.example.com:5000"));
    assert!(resolver.is_allowed("docker.io"));
}

#[test]
fn test_external_registries_can_be_switched_off() {
    let resolver = RegistryMetadataResolver::new(&Registries {
        internal: vec!["docker-registry.default.svc:5000".to_string()],
        disabled: vec![],
        allow_external: false,
        auth: vec![],
    });

    assert!(resolver.is_allowed("docker-registry.default.svc:5000"));
    assert!(resolver.is_allowed("127.0.0.1:5000"));
    assert!(!resolver.is_allowed("docker.io"));
}

#[test]
fn test_configured_auth_replaces_default_method() {
    let resolver = RegistryMetadataResolver::new(&Registries {
        internal: vec!["docker-registry.default.svc:5000".to_string()],
        disabled: vec![],
        allow_external: true,
        auth: vec![
            RegistryAuth {
                registry: "nexus.example.com:8443".to_string(),
                method: AuthMethod::Basic,
            },
            RegistryAuth {
                registry: "docker-registry.default.svc".to_string(),
                method: AuthMethod::None,
            },
        ],
    });

    let nexus = resolver.resolve("nexus.example.com");
    assert_eq!(nexus.auth_method, AuthMethod::Basic);
    assert_eq!(nexus.scheme, Scheme::Https);
    assert!(!nexus.is_internal);

    let internal = resolver.resolve("docker-registry.default.svc:5000");
    assert_eq!(internal.auth_method, AuthMethod::None);
    assert_eq!(internal.scheme, Scheme::Http);

    assert_eq!(resolver.resolve("docker.io").auth_method, AuthMethod::None);
}

#[test]
fn test_scheme_display() {
    assert_eq!(Scheme::Http.to_string(), "http");
    assert_eq!(Scheme::Https.to_string(), "https");
}
