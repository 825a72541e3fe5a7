//! Mock signer for testing.

use crate::error::S3Error;
use crate::signing::{AwsSigner, SignedRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Authorization value added by [`MockSigner`].
pub const MOCK_AUTHORIZATION: &str = "AWS4-HMAC-SHA256 Credential=mock/signing";

/// Recorded sign request.
#[derive(Debug, Clone)]
pub struct SignRequest {
    /// HTTP method.
    pub method: String,
    /// URL that was signed.
    pub url: Url,
    /// Headers passed in by the caller.
    pub headers: HashMap<String, String>,
    /// Body that was signed, if any.
    pub body: Option<Vec<u8>>,
}

/// Mock signer.
///
/// Adds a fixed set of authentication headers and records what it was asked
/// to sign.
pub struct MockSigner {
    headers: Mutex<HashMap<String, String>>,
    error: Mutex<Option<S3Error>>,
    sign_count: AtomicUsize,
    sign_requests: Mutex<Vec<SignRequest>>,
}

impl MockSigner {
    /// Create a new mock signer.
    pub fn new() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("authorization".to_string(), MOCK_AUTHORIZATION.to_string());
        default_headers.insert("x-amz-date".to_string(), "20240115T100000Z".to_string());
        default_headers.insert(
            "x-amz-content-sha256".to_string(),
            crate::signing::UNSIGNED_PAYLOAD.to_string(),
        );

        Self {
            headers: Mutex::new(default_headers),
            error: Mutex::new(None),
            sign_count: AtomicUsize::new(0),
            sign_requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock signer whose next call fails.
    pub fn with_error(error: S3Error) -> Self {
        let signer = Self::new();
        signer.set_error(Some(error));
        signer
    }

    /// Replace the headers added when signing.
    pub fn set_headers(&self, headers: HashMap<String, String>) {
        *self.headers.lock() = headers;
    }

    /// Fail the next sign call with `error`.
    pub fn set_error(&self, error: Option<S3Error>) {
        *self.error.lock() = error;
    }

    /// Number of sign calls.
    pub fn sign_count(&self) -> usize {
        self.sign_count.load(Ordering::Relaxed)
    }

    /// Recorded sign requests.
    pub fn sign_requests(&self) -> Vec<SignRequest> {
        self.sign_requests.lock().clone()
    }

    /// Last sign request.
    pub fn last_sign_request(&self) -> Option<SignRequest> {
        self.sign_requests.lock().last().cloned()
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AwsSigner for MockSigner {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error> {
        self.sign_count.fetch_add(1, Ordering::Relaxed);
        self.sign_requests.lock().push(SignRequest {
            method: method.to_string(),
            url: url.clone(),
            headers: headers.clone(),
            body: body.map(<[u8]>::to_vec),
        });

        if let Some(error) = self.error.lock().take() {
            return Err(error);
        }

        let mut signed_headers = headers.clone();
        signed_headers.extend(self.headers.lock().clone());

        Ok(SignedRequest {
            method: method.to_string(),
            url: url.clone(),
            headers: signed_headers,
        })
    }
}

impl std::fmt::Debug for MockSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSigner")
            .field("sign_count", &self.sign_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SigningError, S3Error};

    #[tokio::test]
    async fn test_mock_signer_adds_headers() {
        let signer = MockSigner::new();
        let url = Url::parse("https://s3.amazonaws.com/bucket/key").unwrap();
        let mut headers = HashMap::new();
        headers.insert("x-amz-acl".to_string(), "public-read".to_string());

        let signed = signer.sign("PUT", &url, &headers, Some(b"body")).await.unwrap();

        assert_eq!(signed.headers["authorization"], MOCK_AUTHORIZATION);
        assert_eq!(signed.headers["x-amz-acl"], "public-read");
        assert_eq!(signer.sign_count(), 1);
        assert_eq!(
            signer.last_sign_request().unwrap().body.as_deref(),
            Some(&b"body"[..])
        );
    }

    #[tokio::test]
    async fn test_mock_signer_error_is_returned_once() {
        let signer = MockSigner::with_error(S3Error::Signing(SigningError::CalculationFailed {
            message: "boom".to_string(),
        }));
        let url = Url::parse("https://s3.amazonaws.com/bucket/key").unwrap();

        assert!(signer.sign("GET", &url, &HashMap::new(), None).await.is_err());
        assert!(signer.sign("GET", &url, &HashMap::new(), None).await.is_ok());
        assert_eq!(signer.sign_count(), 2);
    }
}
