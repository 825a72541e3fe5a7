//! Connection configuration.
//!
//! `ConnectionConfig` carries everything a request needs to address and
//! authenticate itself: credentials, the TLS flag, the endpoint host, the
//! default bucket and the signing region.

use crate::credentials::{
    AwsCredentials, CredentialsProvider, EnvCredentialsProvider, StaticCredentialsProvider,
};
use crate::error::{ConfigurationError, S3Error};
use std::sync::Arc;
use std::time::Duration;

/// Default object-store host.
pub const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

/// Default signing region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration shared by every request made through a connection.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Credentials provider.
    pub credentials_provider: Arc<dyn CredentialsProvider>,

    /// Use `https` (true) or `http` (false).
    pub tls: bool,

    /// Host (and optional port) of the object store, without scheme.
    pub endpoint: String,

    /// Bucket used when an operation is not given one.
    pub default_bucket: Option<String>,

    /// Region used in the request signature scope.
    pub region: String,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Read timeout for a whole request.
    pub read_timeout: Duration,

    /// Verify server certificates.
    pub verify_ssl: bool,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("credentials_provider", &self.credentials_provider.name())
            .field("tls", &self.tls)
            .field("endpoint", &self.endpoint)
            .field("default_bucket", &self.default_bucket)
            .field("region", &self.region)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            credentials_provider: Arc::new(EnvCredentialsProvider::new()),
            tls: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_bucket: None,
            region: DEFAULT_REGION.to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(60),
            verify_ssl: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Configuration with explicit keys and defaults for everything else.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            credentials_provider: Arc::new(StaticCredentialsProvider::new(AwsCredentials::new(
                access_key, secret_key,
            ))),
            ..Self::default()
        }
    }

    /// URL scheme selected by the TLS flag.
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// Build the URL of `key` inside `bucket`.
    ///
    /// One leading `/` on the key is dropped; nested key paths are kept as is.
    pub fn bucket_url(&self, key: &str, bucket: &str) -> String {
        let key = key.strip_prefix('/').unwrap_or(key);
        format!("{}://{}/{}/{}", self.scheme(), self.endpoint, bucket, key)
    }

    /// Pick the bucket for an operation: the explicit one, else the default.
    pub fn resolve_bucket<'a>(&'a self, bucket: Option<&'a str>) -> Result<&'a str, S3Error> {
        bucket
            .or(self.default_bucket.as_deref())
            .ok_or(S3Error::Configuration(ConfigurationError::MissingBucket))
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Default)]
pub struct ConnectionConfigBuilder {
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    tls: Option<bool>,
    endpoint: Option<String>,
    default_bucket: Option<String>,
    region: Option<String>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    verify_ssl: Option<bool>,
}

impl ConnectionConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed access key / secret key pair.
    pub fn credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.credentials_provider = Some(Arc::new(StaticCredentialsProvider::new(
            AwsCredentials::new(access_key, secret_key),
        )));
        self
    }

    /// Set the credentials provider.
    pub fn credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    /// Enable or disable TLS.
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Set the object-store host, e.g. `s3.amazonaws.com` or `localhost:9000`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the default bucket.
    pub fn default_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.default_bucket = Some(bucket.into());
        self
    }

    /// Set the signing region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Enable or disable certificate verification.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    /// Load settings from environment variables.
    ///
    /// Credentials come from the `AWS_*` variables at request time; values
    /// set explicitly on the builder before or after this call win.
    pub fn from_env(mut self) -> Self {
        if self.credentials_provider.is_none() {
            self.credentials_provider = Some(Arc::new(EnvCredentialsProvider::new()));
        }

        if let Ok(region) = std::env::var("AWS_REGION") {
            self.region.get_or_insert(region);
        } else if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            self.region.get_or_insert(region);
        }

        if let Ok(endpoint) = std::env::var("S3_ENDPOINT") {
            self.endpoint.get_or_insert(endpoint);
        }
        if let Ok(bucket) = std::env::var("S3_DEFAULT_BUCKET") {
            self.default_bucket.get_or_insert(bucket);
        }
        if let Ok(val) = std::env::var("S3_TLS") {
            let enabled = !matches!(val.to_lowercase().as_str(), "false" | "0" | "no");
            self.tls.get_or_insert(enabled);
        }

        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ConnectionConfig, S3Error> {
        let defaults = ConnectionConfig::default();

        let endpoint = self.endpoint.unwrap_or(defaults.endpoint);
        validate_endpoint(&endpoint)?;

        if let Some(bucket) = &self.default_bucket {
            if bucket.is_empty() {
                return Err(S3Error::Configuration(
                    ConfigurationError::InvalidConfiguration {
                        field: "default_bucket".to_string(),
                        message: "Default bucket must not be empty".to_string(),
                    },
                ));
            }
        }

        Ok(ConnectionConfig {
            credentials_provider: self
                .credentials_provider
                .unwrap_or(defaults.credentials_provider),
            tls: self.tls.unwrap_or(defaults.tls),
            endpoint,
            default_bucket: self.default_bucket,
            region: self.region.unwrap_or(defaults.region),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            verify_ssl: self.verify_ssl.unwrap_or(defaults.verify_ssl),
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), S3Error> {
    let invalid = |details: &str| {
        S3Error::Configuration(ConfigurationError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            details: details.to_string(),
        })
    };

    if endpoint.is_empty() {
        return Err(invalid("endpoint must not be empty"));
    }
    if endpoint.contains("://") {
        return Err(invalid("give the host only; the scheme follows the TLS flag"));
    }
    if endpoint.contains('/') || endpoint.chars().any(char::is_whitespace) {
        return Err(invalid("endpoint must be a bare host, optionally with a port"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config(tls: bool) -> ConnectionConfig {
        ConnectionConfig::builder()
            .credentials("TEST_ACCESS_KEY", "TEST_SECRET_KEY")
            .tls(tls)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert!(config.tls);
        assert_eq!(config.endpoint, "s3.amazonaws.com");
        assert_eq!(config.region, "us-east-1");
        assert!(config.default_bucket.is_none());
    }

    #[test]
    fn test_url_with_tls() {
        assert_eq!(
            config(true).bucket_url("test_key", "test_bucket"),
            "https://s3.amazonaws.com/test_bucket/test_key"
        );
    }

    #[test_case("test_key", "http://s3.amazonaws.com/test_bucket/test_key" ; "simple key")]
    #[test_case("/test_key", "http://s3.amazonaws.com/test_bucket/test_key" ; "leading slash")]
    #[test_case(
        "folder/for/key/test_key",
        "http://s3.amazonaws.com/test_bucket/folder/for/key/test_key"
        ; "nested key"
    )]
    #[test_case("//test_key", "http://s3.amazonaws.com/test_bucket//test_key" ; "only one slash stripped")]
    fn test_url_without_tls(key: &str, expected: &str) {
        assert_eq!(config(false).bucket_url(key, "test_bucket"), expected);
    }

    #[test]
    fn test_url_custom_endpoint() {
        let config = ConnectionConfig::builder()
            .endpoint("localhost:9000")
            .tls(false)
            .build()
            .unwrap();
        assert_eq!(
            config.bucket_url("a/b.txt", "bucket"),
            "http://localhost:9000/bucket/a/b.txt"
        );
    }

    #[test]
    fn test_resolve_bucket() {
        let config = ConnectionConfig::builder()
            .default_bucket("fallback")
            .build()
            .unwrap();
        assert_eq!(config.resolve_bucket(Some("explicit")).unwrap(), "explicit");
        assert_eq!(config.resolve_bucket(None).unwrap(), "fallback");

        let config = ConnectionConfig::default();
        assert!(matches!(
            config.resolve_bucket(None),
            Err(S3Error::Configuration(ConfigurationError::MissingBucket))
        ));
    }

    #[test_case("https://s3.amazonaws.com" ; "scheme")]
    #[test_case("" ; "empty")]
    #[test_case("s3.amazonaws.com/path" ; "path")]
    fn test_invalid_endpoint(endpoint: &str) {
        let result = ConnectionConfig::builder().endpoint(endpoint).build();
        assert!(matches!(
            result,
            Err(S3Error::Configuration(ConfigurationError::InvalidEndpoint { .. }))
        ));
    }

    #[test]
    fn test_empty_default_bucket_rejected() {
        let result = ConnectionConfig::builder().default_bucket("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let debug = format!("{:?}", ConnectionConfig::new("AKID", "SECRET"));
        assert!(debug.contains("static"));
        assert!(!debug.contains("SECRET"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn leading_slash_is_irrelevant(key in "[a-z0-9_]{1,12}(/[a-z0-9_]{1,12}){0,3}") {
                let config = config(true);
                prop_assert_eq!(
                    config.bucket_url(&format!("/{}", key), "bucket"),
                    config.bucket_url(&key, "bucket")
                );
                let suffix = format!("/bucket/{}", key);
                prop_assert!(config.bucket_url(&key, "bucket").ends_with(&suffix));
            }
        }
    }
}
