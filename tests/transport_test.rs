//! End-to-end tests against a local HTTP server with real signing.

use s3_mini::mocks::TestFixtures;
use s3_mini::{Connection, ConnectionConfig};
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connection(server: &MockServer) -> Connection {
    let endpoint = server.uri().trim_start_matches("http://").to_string();
    let config = ConnectionConfig::builder()
        .credentials("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
        .endpoint(endpoint)
        .tls(false)
        .default_bucket("bucket")
        .build()
        .unwrap();

    Connection::builder().config(config).build().unwrap()
}

#[tokio::test]
async fn test_upload_is_signed_and_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/bucket/notes.txt"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(header("x-amz-acl", "public-read"))
        .and(header("content-type", "text/plain"))
        .and(body_string("hello"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"5d41402a\""))
        .expect(1)
        .mount(&server)
        .await;

    let output = connection(&server)
        .upload("notes.txt", "hello", None)
        .await
        .unwrap();

    assert_eq!(output.e_tag.as_deref(), Some("\"5d41402a\""));
    assert_eq!(output.url, format!("{}/bucket/notes.txt", server.uri()));
}

#[tokio::test]
async fn test_get_to_file_over_http() {
    let server = MockServer::start().await;
    let body = "one\ntwo\nthree";
    Mock::given(method("GET"))
        .and(path("/bucket/data.txt"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("data.txt");
    let path = connection(&server)
        .get_to_file("data.txt", destination.clone(), None)
        .await
        .unwrap();

    assert_eq!(path, destination);
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), body);
}

#[tokio::test]
async fn test_copy_sends_copy_source() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/target/copy.txt"))
        .and(header("x-amz-copy-source", "/bucket/original.txt"))
        .and(header("x-amz-metadata-directive", "COPY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TestFixtures::copy_result_xml()))
        .expect(1)
        .mount(&server)
        .await;

    let output = connection(&server)
        .copy("original.txt", None, "copy.txt", Some("target"), None, false)
        .await
        .unwrap();

    assert_eq!(output.e_tag.as_deref(), Some("\"copied-etag\""));
}

#[tokio::test]
async fn test_delete_and_missing_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/bucket/old.txt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bucket/missing.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_string(TestFixtures::error_xml(
            "NoSuchKey",
            "The specified key does not exist.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let connection = connection(&server);
    connection.delete("old.txt", None).await.unwrap();

    let error = connection.get("missing.txt", None).await.unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.request_id(), Some("test-request-id"));
}

#[tokio::test]
async fn test_list_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/"))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", "logs/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TestFixtures::list_objects_xml(&["logs/a", "logs/b"], None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = connection(&server).list(Some("logs/"), None).await.unwrap();

    let keys: Vec<&str> = output.contents.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["logs/a", "logs/b"]);
}
