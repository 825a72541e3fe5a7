//! Mock HTTP transport for testing.

use crate::error::{NetworkError, S3Error};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, StreamingHttpResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Mock HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl MockResponse {
    /// Create a successful response with empty body.
    pub fn ok() -> Self {
        Self::error(200, Bytes::new())
    }

    /// Create a successful response with body.
    pub fn ok_with_body(body: impl Into<Bytes>) -> Self {
        Self::error(200, body)
    }

    /// Create a 204 No Content response.
    pub fn no_content() -> Self {
        Self::error(204, Bytes::new())
    }

    /// Create a response with any status.
    pub fn error(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header to the response.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add multiple headers to the response.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Mock HTTP transport.
///
/// Returns queued responses in order, then the default response if one is
/// set. Every request is recorded. Streamed bodies are delivered in chunks
/// of `chunk_size` bytes.
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Option<MockResponse>,
    chunk_size: usize,
}

impl MockTransport {
    /// Create a new mock transport with no responses.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a mock transport with queued responses.
    pub fn with_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            default_response: None,
            chunk_size: 8 * 1024,
        }
    }

    /// Create a mock transport with a default response.
    pub fn with_default(response: MockResponse) -> Self {
        Self {
            default_response: Some(response),
            ..Self::new()
        }
    }

    /// Set the chunk size of streamed bodies.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Get the last request made.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn next_response(&self, request: HttpRequest) -> Result<MockResponse, S3Error> {
        self.requests.lock().push(request);

        self.responses
            .lock()
            .pop_front()
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| {
                S3Error::Network(NetworkError::ConnectionFailed {
                    message: "No mock response available".to_string(),
                })
            })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        let mock = self.next_response(request)?;
        Ok(HttpResponse {
            status: mock.status,
            headers: mock.headers,
            body: mock.body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingHttpResponse, S3Error> {
        let mock = self.next_response(request)?;

        let chunks: Vec<Result<Bytes, S3Error>> = mock
            .body
            .chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        Ok(StreamingHttpResponse {
            status: mock.status,
            headers: mock.headers,
            body: stream::iter(chunks).boxed(),
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued_responses", &self.responses.lock().len())
            .field("recorded_requests", &self.requests.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_basic() {
        let transport = MockTransport::with_responses(vec![MockResponse::ok()]);

        let response = transport
            .send(HttpRequest::new("GET", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_queue_order_then_default() {
        let transport = MockTransport::with_default(MockResponse::ok_with_body("default"));
        transport.queue_response(MockResponse::ok_with_body("first"));

        let first = transport
            .send(HttpRequest::new("GET", "https://example.com/1"))
            .await
            .unwrap();
        let second = transport
            .send(HttpRequest::new("GET", "https://example.com/2"))
            .await
            .unwrap();

        assert_eq!(first.body, Bytes::from("first"));
        assert_eq!(second.body, Bytes::from("default"));
    }

    #[tokio::test]
    async fn test_mock_transport_without_responses_fails() {
        let transport = MockTransport::new();
        let result = transport
            .send(HttpRequest::new("GET", "https://example.com"))
            .await;
        assert!(matches!(result, Err(S3Error::Network(_))));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_transport_streams_in_chunks() {
        let transport =
            MockTransport::with_responses(vec![MockResponse::ok_with_body("abcdefg")]).chunk_size(3);

        let response = transport
            .send_streaming(HttpRequest::new("GET", "https://example.com"))
            .await
            .unwrap();
        let chunks: Vec<Bytes> = response
            .body
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        assert_eq!(
            chunks,
            vec![Bytes::from("abc"), Bytes::from("def"), Bytes::from("g")]
        );
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::with_default(MockResponse::ok());

        let request = HttpRequest::new("POST", "https://example.com")
            .with_body(Bytes::from("request body"));
        transport.send(request).await.unwrap();

        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.method, "POST");
        assert_eq!(recorded.url, "https://example.com");
        assert_eq!(recorded.body, Some(Bytes::from("request body")));
    }
}
