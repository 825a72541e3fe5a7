//! AWS Signature V4 signer.

use super::*;
use crate::credentials::CredentialsProvider;
use crate::error::S3Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// A signed request ready to be sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: String,
    /// Full URL including query string.
    pub url: Url,
    /// Caller headers plus the authentication headers.
    pub headers: HashMap<String, String>,
}

/// Signs requests before they reach the transport.
#[async_trait]
pub trait AwsSigner: Send + Sync {
    /// Sign a request.
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error>;
}

/// Signature V4 signer backed by a credentials provider.
pub struct AwsSignerV4 {
    credentials_provider: Arc<dyn CredentialsProvider>,
    region: String,
}

impl AwsSignerV4 {
    /// Create a new signer.
    pub fn new(credentials_provider: Arc<dyn CredentialsProvider>, region: impl Into<String>) -> Self {
        Self {
            credentials_provider,
            region: region.into(),
        }
    }

    fn host_header(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Signing headers first, then caller headers that do not shadow them.
    fn build_signing_headers(
        url: &Url,
        original_headers: &HashMap<String, String>,
        amz_date: &str,
        payload_hash: &str,
    ) -> Vec<(String, String)> {
        let mut headers = vec![
            ("host".to_string(), Self::host_header(url)),
            ("x-amz-date".to_string(), amz_date.to_string()),
            ("x-amz-content-sha256".to_string(), payload_hash.to_string()),
        ];

        for (name, value) in original_headers {
            let name_lower = name.to_lowercase();
            if name_lower != "host"
                && name_lower != "x-amz-date"
                && name_lower != "x-amz-content-sha256"
            {
                headers.push((name.clone(), value.clone()));
            }
        }

        headers
    }
}

#[async_trait]
impl AwsSigner for AwsSignerV4 {
    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Result<SignedRequest, S3Error> {
        let credentials = self.credentials_provider.get_credentials().await?;
        let timestamp = Utc::now();
        let amz_date = format_datetime(&timestamp);
        let payload_hash = sha256_hex(body.unwrap_or_default());

        let mut signing_headers =
            Self::build_signing_headers(url, headers, &amz_date, &payload_hash);
        if let Some(token) = credentials.session_token() {
            signing_headers.push(("x-amz-security-token".to_string(), token.to_string()));
        }

        let authorization = sign_request(
            method,
            url.path(),
            url.query().unwrap_or(""),
            &signing_headers,
            &payload_hash,
            &credentials,
            &self.region,
            &timestamp,
        )?;

        let mut final_headers = headers.clone();
        for (name, value) in signing_headers {
            // host is set by the HTTP client from the URL
            if name != "host" {
                final_headers.insert(name, value);
            }
        }
        final_headers.insert("authorization".to_string(), authorization);

        Ok(SignedRequest {
            method: method.to_string(),
            url: url.clone(),
            headers: final_headers,
        })
    }
}

impl std::fmt::Debug for AwsSignerV4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSignerV4")
            .field("credentials_provider", &self.credentials_provider.name())
            .field("region", &self.region)
            .finish()
    }
}
