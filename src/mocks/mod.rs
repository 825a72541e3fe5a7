//! Mock implementations for testing.
//!
//! [`mock_connection`] wires a [`Connection`] to a [`MockTransport`] and a
//! [`MockSigner`] so tests can assert on exactly what would be sent.

mod credentials;
mod signer;
mod transport;

pub use credentials::{MockCredentialsProvider, MOCK_ACCESS_KEY_ID, MOCK_SECRET_ACCESS_KEY};
pub use signer::{MockSigner, SignRequest, MOCK_AUTHORIZATION};
pub use transport::{MockResponse, MockTransport};

use crate::client::Connection;
use crate::config::ConnectionConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Connection backed by mocks, plus handles to inspect them.
pub struct MockConnection {
    /// The connection under test.
    pub connection: Connection,
    /// Transport recording every request.
    pub transport: Arc<MockTransport>,
    /// Signer recording every sign call.
    pub signer: Arc<MockSigner>,
}

/// Build a connection on top of `transport` with a mock signer.
pub fn mock_connection(config: ConnectionConfig, transport: MockTransport) -> MockConnection {
    let transport = Arc::new(transport);
    let signer = Arc::new(MockSigner::new());
    let connection = Connection::from_parts(config, transport.clone(), signer.clone());

    MockConnection {
        connection,
        transport,
        signer,
    }
}

/// Test fixtures for S3 operations.
pub struct TestFixtures;

impl TestFixtures {
    /// Configuration with fixed keys and TLS on.
    pub fn config() -> ConnectionConfig {
        ConnectionConfig::new(MOCK_ACCESS_KEY_ID, MOCK_SECRET_ACCESS_KEY)
    }

    /// Configuration with a default bucket.
    pub fn config_with_default_bucket(bucket: &str) -> ConnectionConfig {
        ConnectionConfig {
            default_bucket: Some(bucket.to_string()),
            ..Self::config()
        }
    }

    /// ListObjectsV2 page.
    pub fn list_objects_xml(keys: &[&str], next_token: Option<&str>) -> String {
        let contents: String = keys
            .iter()
            .map(|key| {
                format!(
                    "<Contents><Key>{}</Key><LastModified>2024-01-15T10:30:00.000Z</LastModified>\
                     <ETag>\"abc123\"</ETag><Size>1024</Size><StorageClass>STANDARD</StorageClass></Contents>",
                    key
                )
            })
            .collect();

        let continuation = next_token
            .map(|token| format!("<NextContinuationToken>{}</NextContinuationToken>", token))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>test-bucket</Name><KeyCount>{}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>{}</IsTruncated>{}{}</ListBucketResult>"#,
            keys.len(),
            next_token.is_some(),
            continuation,
            contents
        )
    }

    /// S3 error document.
    pub fn error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
    <Code>{}</Code>
    <Message>{}</Message>
    <RequestId>test-request-id</RequestId>
</Error>"#,
            code, message
        )
    }

    /// Copy result document.
    pub fn copy_result_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<CopyObjectResult>
    <LastModified>2024-01-15T10:30:00.000Z</LastModified>
    <ETag>"copied-etag"</ETag>
</CopyObjectResult>"#
    }

    /// Headers of a successful GET.
    pub fn get_object_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        headers.insert("etag".to_string(), "\"abc123\"".to_string());
        headers.insert("last-modified".to_string(), "Mon, 15 Jan 2024 10:30:00 GMT".to_string());
        headers.insert("x-amz-meta-owner".to_string(), "tests".to_string());
        headers.insert("x-amz-request-id".to_string(), "test-request-id".to_string());
        headers
    }

    /// Headers of a successful PUT.
    pub fn put_object_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("etag".to_string(), "\"abc123\"".to_string());
        headers.insert("x-amz-request-id".to_string(), "test-request-id".to_string());
        headers
    }
}
