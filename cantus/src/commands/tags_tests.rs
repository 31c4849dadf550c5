use super::*;
use libcantus::{Config, TagKind};

fn entries() -> Vec<TagEntry> {
    ["latest", "1.2.3", "1.2.3-SNAPSHOT"]
        .into_iter()
        .map(TagEntry::new)
        .collect()
}

#[test]
fn test_row_shows_wire_kind() {
    let row = TagRow::from(&TagEntry::new("abc1234"));
    assert_eq!(row.name, "abc1234");
    assert_eq!(row.kind, "COMMIT_HASH");
}

#[test]
fn test_render_pretty_table() {
    let output = render_tags(&entries(), OutputFormat::Pretty).unwrap();
    assert!(output.contains("TAG"));
    assert!(output.contains("TYPE"));
    assert!(output.contains("BUGFIX"));
    assert!(output.contains("SNAPSHOT"));
}

#[test]
fn test_render_json_uses_type_field() {
    let output = render_tags(&entries(), OutputFormat::Json).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json[0]["name"], "latest");
    assert_eq!(json[0]["type"], "LATEST");
    assert_eq!(json[1]["type"], "BUGFIX");
}

#[tokio::test]
async fn test_handle_tags_over_the_wire() {
    let mut server = mockito::Server::new_async().await;
    let tags = server
        .mock("GET", "/v2/group/name/tags/list")
        .match_header("authorization", "Bearer t")
        .with_status(200)
        .with_body(r#"{"name":"group/name","tags":["1.0.0","latest"]}"#)
        .expect(2)
        .create_async()
        .await;

    let ctx = AppContext {
        config: Config::default(),
        config_path: None,
        format: OutputFormat::Pretty,
    };
    let cantus = ctx.cantus().unwrap();
    let reference = format!("{}/group/name", server.host_with_port());

    assert!(handle_tags(&ctx, &cantus, &reference, None, Some("t")).await.is_ok());
    assert!(
        handle_tags(&ctx, &cantus, &reference, Some("nothing"), Some("t"))
            .await
            .is_ok()
    );
    tags.assert_async().await;
    assert_eq!(TagKind::classify("1.0.0"), TagKind::Bugfix);
}
