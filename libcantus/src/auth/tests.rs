use super::*;

#[test]
fn test_credential_parse_bare_token() {
    let cred = Credential::parse("abc123").unwrap();
    assert_eq!(cred.token(), "abc123");
}

#[test]
fn test_credential_parse_keeps_last_word_of_header_value() {
    let cred = Credential::parse("Bearer abc123").unwrap();
    assert_eq!(cred.token(), "abc123");

    let cred = Credential::parse("  Basic   dXNlcjpwYXNz ").unwrap();
    assert_eq!(cred.token(), "dXNlcjpwYXNz");
}

#[test]
fn test_credential_parse_blank_is_none() {
    assert!(Credential::parse("").is_none());
    assert!(Credential::parse(" \t ").is_none());
}

#[test]
fn test_credential_parse_scheme_without_token_is_none() {
    assert!(Credential::parse("Bearer ").is_none());
    assert!(Credential::parse("bearer").is_none());
    assert!(Credential::parse("  BASIC\t").is_none());
}

#[test]
fn test_credential_debug_redacts_token() {
    let cred = Credential::parse("secret-token").unwrap();
    let debug = format!("{:?}", cred);
    assert!(!debug.contains("secret-token"));
}

#[test]
fn test_header_value_per_method() {
    let cred = Credential::parse("tok").unwrap();

    assert_eq!(
        AuthMethod::Bearer.header_value(Some(&cred)),
        Some("Bearer tok".to_string())
    );
    assert_eq!(
        AuthMethod::Basic.header_value(Some(&cred)),
        Some("Basic tok".to_string())
    );
    assert_eq!(AuthMethod::None.header_value(Some(&cred)), None);
    assert_eq!(AuthMethod::Bearer.header_value(None), None);
}

#[test]
fn test_requires_credential() {
    assert!(!AuthMethod::None.requires_credential());
    assert!(AuthMethod::Bearer.requires_credential());
    assert!(AuthMethod::Basic.requires_credential());
}

#[test]
fn test_auth_method_serde_lowercase() {
    let json = serde_json::to_string(&AuthMethod::Bearer).unwrap();
    assert_eq!(json, "\"bearer\"");

    let method: AuthMethod = serde_json::from_str("\"basic\"").unwrap();
    assert_eq!(method, AuthMethod::Basic);
}
