//! Integration tests for attachment upload and download

mod common;

use common::{MockTransport, client};
use shotgun_api::ShotgunError;
use shotgun_api::api::HttpResponse;
use std::path::PathBuf;

async fn temp_file(name: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name));
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

#[tokio::test]
async fn test_upload_sends_file_and_fields() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    mock.push_response(HttpResponse::ok("1:123\n"));

    let path = temp_file("sg_logo.jpg", b"jpeg bytes").await?;
    let id = client(&mock).upload("Ticket", 7, &path, Some("review")).await?;
    assert_eq!(id, 123);

    let upload = &mock.uploads()[0];
    assert_eq!(upload.url, "http://server_path/upload/upload_file");
    assert_eq!(upload.file_field, "file");
    assert!(upload.file_name.ends_with("sg_logo.jpg"));
    assert_eq!(upload.content, b"jpeg bytes");

    let field = |name: &str| upload.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());
    assert_eq!(field("entity_type"), Some("Ticket"));
    assert_eq!(field("entity_id"), Some("7"));
    assert_eq!(field("script_name"), Some("script_name"));
    assert_eq!(field("script_key"), Some("api_key"));
    assert_eq!(field("tag_list"), Some("review"));

    tokio::fs::remove_file(&path).await?;
    Ok(())
}

#[tokio::test]
async fn test_upload_thumbnail() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    mock.push_response(HttpResponse::ok("1:9"));

    let path = temp_file("thumb.png", b"png").await?;
    let id = client(&mock).upload_thumbnail("Version", 3, &path, None).await?;
    assert_eq!(id, 9);

    let upload = &mock.uploads()[0];
    assert_eq!(upload.url, "http://server_path/upload/publish_thumbnail");
    assert_eq!(upload.file_field, "thumb_image");
    assert!(!upload.fields.iter().any(|(k, _)| k == "tag_list"));

    mock.push_response(HttpResponse::ok("1:10"));
    client(&mock).upload_thumbnail("Version", 3, &path, Some("approved")).await?;
    let tagged = &mock.uploads()[1];
    assert_eq!(tagged.file_field, "thumb_image");
    assert!(tagged.fields.contains(&("tag_list".to_string(), "approved".to_string())));

    tokio::fs::remove_file(&path).await?;
    Ok(())
}

#[tokio::test]
async fn test_upload_failure_body() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    mock.push_response(HttpResponse::ok("0:could not store"));

    let path = temp_file("bad.jpg", b"x").await?;
    let err = client(&mock).upload("Ticket", 7, &path, None).await.unwrap_err();
    assert!(matches!(err, ShotgunError::Response(_)));

    tokio::fs::remove_file(&path).await?;
    Ok(())
}

#[tokio::test]
async fn test_upload_missing_file() {
    let mock = MockTransport::new();
    let err = client(&mock)
        .upload("Ticket", 7, "/definitely/not/here.jpg", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ShotgunError::Io(_)));
    assert!(mock.uploads().is_empty());
}

/// Bytes come back exactly as stored; unknown attachments are None
#[tokio::test]
async fn test_download_attachment() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    let content = vec![0u8, 159, 146, 150, 255];
    mock.push_response(HttpResponse::ok(content.clone()));
    mock.push_response(HttpResponse::new(404, "Not Found", ""));

    let sg = client(&mock);
    assert_eq!(sg.download_attachment(123).await?, Some(content));
    assert_eq!(sg.download_attachment(124).await?, None);
    assert_eq!(
        mock.downloads(),
        vec![
            "http://server_path/file_serve/attachment/123".to_string(),
            "http://server_path/file_serve/attachment/124".to_string()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_download_server_error() {
    let mock = MockTransport::new();
    mock.push_response(HttpResponse::new(500, "Internal Server Error", ""));

    let err = client(&mock).download_attachment(1).await.unwrap_err();
    assert!(matches!(err, ShotgunError::Protocol { status: 500, .. }));
}
