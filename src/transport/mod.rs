//! HTTP transport layer for S3 requests.
//!
//! The objects service hands a fully signed [`HttpRequest`] to an
//! [`HttpTransport`] and gets back either a buffered [`HttpResponse`] or a
//! [`StreamingHttpResponse`] whose body has not been read yet.

use crate::error::{NetworkError, S3Error, TransferError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::time::Duration;

/// Response body delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, S3Error>>;

/// HTTP request to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add multiple headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// HTTP response with a fully read body.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Get the AWS request ID from response headers.
    pub fn request_id(&self) -> Option<&str> {
        self.get_header("x-amz-request-id")
    }

    /// Get the content length.
    pub fn content_length(&self) -> Option<u64> {
        self.get_header("content-length").and_then(|v| v.parse().ok())
    }

    /// Get the content type.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Get the ETag.
    pub fn etag(&self) -> Option<&str> {
        self.get_header("etag")
    }
}

/// HTTP response whose body is still on the wire.
pub struct StreamingHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body stream.
    pub body: ByteStream,
}

impl StreamingHttpResponse {
    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Read the whole body into memory.
    pub async fn into_buffered(self) -> Result<HttpResponse, S3Error> {
        let body = self
            .body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?
            .freeze();

        Ok(HttpResponse {
            status: self.status,
            headers: self.headers,
            body,
        })
    }
}

impl std::fmt::Debug for StreamingHttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingHttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and read the whole response body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error>;

    /// Send a request and return as soon as the response headers arrive.
    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse, S3Error>;
}

/// Default HTTP transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, S3Error> {
        Self::builder().build()
    }

    /// Create a transport builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    async fn execute(&self, request: HttpRequest) -> Result<reqwest::Response, S3Error> {
        let method = request.method.parse::<reqwest::Method>().map_err(|e| {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: format!("Invalid HTTP method: {}", e),
            })
        })?;

        let mut req_builder = self.client.request(method, &request.url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        req_builder.send().await.map_err(|e| self.map_send_error(e))
    }

    fn map_send_error(&self, e: reqwest::Error) -> S3Error {
        if e.is_timeout() {
            S3Error::Network(NetworkError::Timeout {
                duration: self.read_timeout,
            })
        } else {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: e.to_string(),
            })
        }
    }

    fn collect_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        let response = self.execute(request).await?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);

        let body = response.bytes().await.map_err(|e| {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: format!("Failed to read response body: {}", e),
            })
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse, S3Error> {
        let response = self.execute(request).await?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| {
                    S3Error::Transfer(TransferError::StreamInterrupted {
                        bytes_transferred: 0,
                        message: e.to_string(),
                    })
                })
            })
            .boxed();

        Ok(StreamingHttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for reqwest transport.
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
    verify_ssl: bool,
    user_agent: String,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(60),
            verify_ssl: true,
            user_agent: format!("s3-mini/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set whether to verify SSL certificates.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport, S3Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| {
                S3Error::Network(NetworkError::TlsError {
                    message: e.to_string(),
                })
            })?;

        Ok(ReqwestTransport {
            client,
            read_timeout: self.read_timeout,
        })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_http_request_builder() {
        let request = HttpRequest::new("PUT", "https://s3.amazonaws.com/bucket/key")
            .with_header("Content-Type", "text/plain")
            .with_body(b"test body".as_slice());

        assert_eq!(request.method, "PUT");
        assert_eq!(request.get_header("content-type"), Some("text/plain"));
        assert_eq!(request.body, Some(Bytes::from_static(b"test body")));
    }

    #[test]
    fn test_http_response_headers() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/xml".to_string());
        headers.insert("x-amz-request-id".to_string(), "ABC123".to_string());
        headers.insert("ETag".to_string(), "\"abc123\"".to_string());
        headers.insert("Content-Length".to_string(), "1024".to_string());

        let response = HttpResponse {
            status: 200,
            headers,
            body: Bytes::new(),
        };

        assert!(response.is_success());
        assert_eq!(response.content_type(), Some("application/xml"));
        assert_eq!(response.request_id(), Some("ABC123"));
        assert_eq!(response.etag(), Some("\"abc123\""));
        assert_eq!(response.content_length(), Some(1024));
    }

    #[test]
    fn test_http_response_status() {
        for (status, success) in [(200, true), (204, true), (304, false), (404, false), (500, false)] {
            let response = HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::new(),
            };
            assert_eq!(response.is_success(), success, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_streaming_response_into_buffered() {
        let chunks: Vec<Result<Bytes, S3Error>> =
            vec![Ok(Bytes::from("foo\n")), Ok(Bytes::from("bar"))];
        let response = StreamingHttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: stream::iter(chunks).boxed(),
        };

        let buffered = response.into_buffered().await.unwrap();
        assert_eq!(buffered.body, Bytes::from("foo\nbar"));
    }

    #[test]
    fn test_transport_builder() {
        let transport = ReqwestTransport::builder()
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(Duration::from_secs(30))
            .verify_ssl(true)
            .build();

        assert!(transport.is_ok());
    }
}
