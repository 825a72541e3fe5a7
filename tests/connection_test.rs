//! Integration tests for the Connection facade.

use bytes::Bytes;
use s3_mini::error::{ConfigurationError, S3Error, TransferError};
use s3_mini::mocks::{mock_connection, MockResponse, MockTransport, TestFixtures};
use s3_mini::types::Expires;
use std::collections::HashMap;
use test_case::test_case;

#[test_case(true, "https://s3.amazonaws.com/test_bucket/test_key" ; "with tls")]
#[test_case(false, "http://s3.amazonaws.com/test_bucket/test_key" ; "without tls")]
fn test_bucket_url(tls: bool, expected: &str) {
    let mut mock = mock_connection(TestFixtures::config(), MockTransport::new());
    mock.connection.set_tls(tls);

    assert_eq!(mock.connection.bucket_url("test_key", "test_bucket"), expected);
}

#[tokio::test]
async fn test_default_bucket_is_used() {
    let mock = mock_connection(
        TestFixtures::config_with_default_bucket("default_bucket"),
        MockTransport::with_default(MockResponse::ok()),
    );

    mock.connection.delete("key", None).await.unwrap();
    mock.connection.delete("key", Some("other_bucket")).await.unwrap();

    let requests = mock.transport.requests();
    assert_eq!(requests[0].url, "https://s3.amazonaws.com/default_bucket/key");
    assert_eq!(requests[1].url, "https://s3.amazonaws.com/other_bucket/key");
}

#[tokio::test]
async fn test_missing_bucket_fails_before_sending() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_default(MockResponse::ok()),
    );

    let error = mock.connection.get("key", None).await.unwrap_err();

    assert!(matches!(
        error,
        S3Error::Configuration(ConfigurationError::MissingBucket)
    ));
    assert_eq!(mock.transport.request_count(), 0);
    assert_eq!(mock.signer.sign_count(), 0);
}

#[tokio::test]
async fn test_set_tls_applies_to_requests() {
    let mut mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_default(MockResponse::ok()),
    );

    mock.connection.delete("test_key", Some("test_bucket")).await.unwrap();
    mock.connection.set_tls(false);
    mock.connection.delete("test_key", Some("test_bucket")).await.unwrap();

    let requests = mock.transport.requests();
    assert_eq!(requests[0].url, "https://s3.amazonaws.com/test_bucket/test_key");
    assert_eq!(requests[1].url, "http://s3.amazonaws.com/test_bucket/test_key");
}

#[tokio::test]
async fn test_get_returns_body() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_responses(vec![MockResponse::ok_with_body("hello world")
            .with_headers(TestFixtures::get_object_headers())]),
    );

    let object = mock.connection.get("greeting.txt", Some("bucket")).await.unwrap();

    assert_eq!(object.text(), "hello world");
    assert_eq!(object.info.e_tag.as_deref(), Some("\"abc123\""));
}

#[tokio::test]
async fn test_get_to_file_returns_path() {
    let body = "alpha\nbeta\ngamma\n";
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_responses(vec![MockResponse::ok_with_body(body)]).chunk_size(3),
    );
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.txt");

    let path = mock
        .connection
        .get_to_file("file.txt", destination.clone(), Some("bucket"))
        .await
        .unwrap();

    assert_eq!(path, destination);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    assert_eq!(mock.transport.last_request().unwrap().method, "GET");
}

#[tokio::test]
async fn test_get_stream_reads_lazily() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_responses(vec![MockResponse::ok_with_body("0123456789")]).chunk_size(2),
    );

    let output = mock.connection.get_stream("digits", Some("bucket")).await.unwrap();

    assert_eq!(output.into_bytes().await.unwrap(), Bytes::from("0123456789"));
}

#[tokio::test]
async fn test_copy_defaults_source_and_destination_bucket() {
    let mock = mock_connection(
        TestFixtures::config_with_default_bucket("default_bucket"),
        MockTransport::with_default(MockResponse::ok_with_body(TestFixtures::copy_result_xml())),
    );

    mock.connection
        .copy("from_key", None, "to_key", Some("to_bucket"), None, false)
        .await
        .unwrap();

    let recorded = mock.transport.last_request().unwrap();
    assert_eq!(recorded.url, "https://s3.amazonaws.com/to_bucket/to_key");
    assert_eq!(
        recorded.get_header("x-amz-copy-source"),
        Some("/default_bucket/from_key")
    );
    assert_eq!(recorded.get_header("x-amz-metadata-directive"), Some("COPY"));
    assert!(recorded.get_header("x-amz-acl").is_none());
}

#[tokio::test]
async fn test_update_metadata_passes_names_verbatim() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_default(MockResponse::ok()),
    );

    let mut metadata = HashMap::new();
    metadata.insert("Content-Type".to_string(), "application/json".to_string());
    metadata.insert("x-amz-meta-revision".to_string(), "7".to_string());
    mock.connection
        .update_metadata("doc.json", metadata, Some("bucket"), true)
        .await
        .unwrap();

    let signed = mock.signer.last_sign_request().unwrap();
    assert_eq!(signed.headers["Content-Type"], "application/json");
    assert_eq!(signed.headers["x-amz-meta-revision"], "7");
    assert_eq!(signed.headers["x-amz-copy-source"], "/bucket/doc.json");
    assert_eq!(signed.headers["x-amz-acl"], "public-read");
}

#[tokio::test]
async fn test_upload_with_options() {
    let mock = mock_connection(
        TestFixtures::config_with_default_bucket("bucket"),
        MockTransport::with_default(MockResponse::ok()),
    );

    let output = mock
        .connection
        .upload_with("styles/site.css", "body {}", None, |request| {
            request
                .with_public(false)
                .with_expires(Expires::Max)
                .with_reduced_redundancy(true)
        })
        .await
        .unwrap();

    assert_eq!(output.url, "https://s3.amazonaws.com/bucket/styles/site.css");

    let signed = mock.signer.last_sign_request().unwrap();
    assert_eq!(signed.headers["content-type"], "text/css");
    assert_eq!(signed.headers["cache-control"], "max-age=31536000");
    assert_eq!(signed.headers["x-amz-storage-class"], "REDUCED_REDUNDANCY");
    assert!(!signed.headers.contains_key("x-amz-acl"));
}

#[tokio::test]
async fn test_upload_file_reads_contents() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_default(MockResponse::ok()),
    );
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("report.json");
    std::fs::write(&source, "{\"ok\":true}").unwrap();

    mock.connection
        .upload_file(&source, "reports/report.json", Some("bucket"))
        .await
        .unwrap();

    let recorded = mock.transport.last_request().unwrap();
    assert_eq!(recorded.url, "https://s3.amazonaws.com/bucket/reports/report.json");
    assert_eq!(recorded.body, Some(Bytes::from("{\"ok\":true}")));
    assert_eq!(recorded.get_header("content-type"), Some("application/json"));
    assert_eq!(recorded.get_header("x-amz-acl"), Some("public-read"));
}

#[tokio::test]
async fn test_upload_file_missing_source() {
    let mock = mock_connection(
        TestFixtures::config(),
        MockTransport::with_default(MockResponse::ok()),
    );
    let dir = tempfile::tempdir().unwrap();

    let error = mock
        .connection
        .upload_file(dir.path().join("absent.bin"), "absent.bin", Some("bucket"))
        .await
        .unwrap_err();

    assert!(matches!(error, S3Error::Transfer(TransferError::Io { .. })));
    assert_eq!(mock.transport.request_count(), 0);
}

#[tokio::test]
async fn test_list_all_with_prefix() {
    let mock = mock_connection(
        TestFixtures::config_with_default_bucket("bucket"),
        MockTransport::with_responses(vec![
            MockResponse::ok_with_body(TestFixtures::list_objects_xml(&["logs/1"], Some("next"))),
            MockResponse::ok_with_body(TestFixtures::list_objects_xml(&["logs/2"], None)),
        ]),
    );

    let objects = mock.connection.list_all(Some("logs/"), None).await.unwrap();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].key, "logs/2");
    assert_eq!(objects[1].size, 1024);
    assert!(mock.transport.requests()[1].url.contains("prefix=logs%2F"));
}
