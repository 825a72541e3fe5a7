//! Connection to an S3-compatible object store.
//!
//! [`Connection`] owns the configuration, the HTTP transport and the signer,
//! and exposes one method per object operation. Methods take an optional
//! bucket; `None` falls back to the connection's default bucket.

use crate::config::ConnectionConfig;
use crate::error::{S3Error, TransferError};
use crate::services::ObjectsService;
use crate::signing::{AwsSigner, AwsSignerV4};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::*;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Connection to an object store.
pub struct Connection {
    config: Arc<ConnectionConfig>,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AwsSigner>,

    objects: OnceCell<ObjectsService>,
}

impl Connection {
    /// Create a connection with explicit keys and default settings.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, S3Error> {
        ConnectionBuilder::new()
            .config(ConnectionConfig::new(access_key, secret_key))
            .build()
    }

    /// Create a connection builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Create a connection from parts.
    pub fn from_parts(
        config: ConnectionConfig,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AwsSigner>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            signer,
            objects: OnceCell::new(),
        }
    }

    /// Connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Switch between `https` and `http`.
    pub fn set_tls(&mut self, tls: bool) {
        Arc::make_mut(&mut self.config).tls = tls;
        self.objects = OnceCell::new();
    }

    /// Build the URL of `key` inside `bucket`.
    pub fn bucket_url(&self, key: &str, bucket: &str) -> String {
        self.config.bucket_url(key, bucket)
    }

    /// Objects service accepting full request types.
    pub fn objects(&self) -> &ObjectsService {
        self.objects.get_or_init(|| {
            ObjectsService::new(
                self.config.clone(),
                self.transport.clone(),
                self.signer.clone(),
            )
        })
    }

    fn bucket<'a>(&'a self, bucket: Option<&'a str>) -> Result<&'a str, S3Error> {
        self.config.resolve_bucket(bucket)
    }

    /// Download an object into memory.
    pub async fn get(&self, key: &str, bucket: Option<&str>) -> Result<ObjectResponse, S3Error> {
        let request = GetObjectRequest::new(self.bucket(bucket)?, key);
        match self.objects().get(request).await? {
            GetObjectOutput::Buffered(response) => Ok(response),
            GetObjectOutput::Streaming(stream) => stream.collect().await,
            GetObjectOutput::Saved { path, .. } => Err(S3Error::Response(
                crate::error::ResponseError::InvalidResponse {
                    message: format!("unexpected save to {}", path.display()),
                },
            )),
        }
    }

    /// Open an object and return its body unread.
    pub async fn get_stream(&self, key: &str, bucket: Option<&str>) -> Result<GetObjectOutput, S3Error> {
        let request = GetObjectRequest::new(self.bucket(bucket)?, key).with_stream(true);
        self.objects().get(request).await
    }

    /// Download an object into a local file and return the file's path.
    pub async fn get_to_file(
        &self,
        key: &str,
        destination: impl Into<PathBuf>,
        bucket: Option<&str>,
    ) -> Result<PathBuf, S3Error> {
        let destination = destination.into();
        let request = GetObjectRequest::new(self.bucket(bucket)?, key)
            .with_destination(destination.clone());
        let output = self.objects().get(request).await?;
        Ok(output.saved_path().map(Path::to_path_buf).unwrap_or(destination))
    }

    /// Delete an object.
    pub async fn delete(&self, key: &str, bucket: Option<&str>) -> Result<DeleteObjectOutput, S3Error> {
        let request = DeleteObjectRequest::new(self.bucket(bucket)?, key);
        self.objects().delete(request).await
    }

    /// Copy an object.
    ///
    /// With `metadata` the copy gets that metadata instead of the source's.
    pub async fn copy(
        &self,
        from_key: &str,
        from_bucket: Option<&str>,
        to_key: &str,
        to_bucket: Option<&str>,
        metadata: Option<HashMap<String, String>>,
        public: bool,
    ) -> Result<CopyObjectOutput, S3Error> {
        let mut request = CopyObjectRequest::new(
            self.bucket(from_bucket)?,
            from_key,
            self.bucket(to_bucket)?,
            to_key,
        )
        .with_public(public);
        if let Some(metadata) = metadata {
            request = request.with_metadata(metadata);
        }
        self.objects().copy(request).await
    }

    /// Replace an object's metadata.
    ///
    /// Each entry is sent as a header under its given name.
    pub async fn update_metadata(
        &self,
        key: &str,
        metadata: HashMap<String, String>,
        bucket: Option<&str>,
        public: bool,
    ) -> Result<UpdateMetadataOutput, S3Error> {
        let request = UpdateMetadataRequest::new(self.bucket(bucket)?, key)
            .with_metadata_map(metadata)
            .with_public(public);
        self.objects().update_metadata(request).await
    }

    /// Upload an object with default options (public, content type guessed).
    pub async fn upload(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        bucket: Option<&str>,
    ) -> Result<UploadObjectOutput, S3Error> {
        self.upload_with(key, body, bucket, |request| request).await
    }

    /// Upload an object, adjusting the request before it is sent.
    pub async fn upload_with<F>(
        &self,
        key: &str,
        body: impl Into<Bytes>,
        bucket: Option<&str>,
        configure: F,
    ) -> Result<UploadObjectOutput, S3Error>
    where
        F: FnOnce(UploadObjectRequest) -> UploadObjectRequest,
    {
        let request = configure(UploadObjectRequest::new(self.bucket(bucket)?, key, body));
        self.objects().upload(request).await
    }

    /// Upload the contents of a local file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        bucket: Option<&str>,
    ) -> Result<UploadObjectOutput, S3Error> {
        let bucket = self.bucket(bucket)?;
        let path = path.as_ref();
        let body = tokio::fs::read(path).await.map_err(|source| {
            S3Error::Transfer(TransferError::Io {
                path: path.display().to_string(),
                source,
            })
        })?;
        self.objects()
            .upload(UploadObjectRequest::new(bucket, key, body))
            .await
    }

    /// Fetch an object's metadata.
    pub async fn head_object(&self, key: &str, bucket: Option<&str>) -> Result<HeadObjectOutput, S3Error> {
        let request = HeadObjectRequest::new(self.bucket(bucket)?, key);
        self.objects().head(request).await
    }

    /// List one page of objects under `prefix`.
    pub async fn list(&self, prefix: Option<&str>, bucket: Option<&str>) -> Result<ListObjectsOutput, S3Error> {
        self.objects().list(self.list_request(prefix, bucket)?).await
    }

    /// List every object under `prefix`.
    pub async fn list_all(&self, prefix: Option<&str>, bucket: Option<&str>) -> Result<Vec<S3Object>, S3Error> {
        self.objects().list_all(self.list_request(prefix, bucket)?).await
    }

    fn list_request(&self, prefix: Option<&str>, bucket: Option<&str>) -> Result<ListObjectsRequest, S3Error> {
        let request = ListObjectsRequest::new(self.bucket(bucket)?);
        Ok(match prefix {
            Some(prefix) => request.with_prefix(prefix),
            None => request,
        })
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Connection`].
pub struct ConnectionBuilder {
    config: Option<ConnectionConfig>,
    from_env: bool,
    transport: Option<Arc<dyn HttpTransport>>,
    signer: Option<Arc<dyn AwsSigner>>,
}

impl ConnectionBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            from_env: false,
            transport: None,
            signer: None,
        }
    }

    /// Use the provided configuration.
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom signer.
    pub fn signer(mut self, signer: Arc<dyn AwsSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build the connection.
    pub fn build(self) -> Result<Connection, S3Error> {
        let config = if let Some(config) = self.config {
            config
        } else if self.from_env {
            ConnectionConfig::builder().from_env().build()?
        } else {
            ConnectionConfig::default()
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .connect_timeout(config.connect_timeout)
                    .read_timeout(config.read_timeout)
                    .verify_ssl(config.verify_ssl)
                    .build()?,
            ),
        };

        let signer = match self.signer {
            Some(signer) => signer,
            None => Arc::new(AwsSignerV4::new(
                config.credentials_provider.clone(),
                config.region.clone(),
            )),
        };

        Ok(Connection::from_parts(config, transport, signer))
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let connection = ConnectionBuilder::new().build().unwrap();
        assert!(connection.config().tls);
        assert_eq!(connection.config().endpoint, "s3.amazonaws.com");
    }

    #[test]
    fn test_builder_with_config() {
        let config = ConnectionConfig::builder()
            .region("eu-west-1")
            .default_bucket("bucket")
            .build()
            .unwrap();

        let connection = Connection::builder().config(config).build().unwrap();
        assert_eq!(connection.config().region, "eu-west-1");
        assert_eq!(connection.config().default_bucket.as_deref(), Some("bucket"));
    }

    #[test]
    fn test_set_tls_changes_scheme() {
        let mut connection = Connection::new("AKID", "SECRET").unwrap();
        assert_eq!(
            connection.bucket_url("test_key", "test_bucket"),
            "https://s3.amazonaws.com/test_bucket/test_key"
        );

        connection.set_tls(false);
        assert_eq!(
            connection.bucket_url("test_key", "test_bucket"),
            "http://s3.amazonaws.com/test_bucket/test_key"
        );
        assert!(!connection.objects().config().tls);
    }
}
