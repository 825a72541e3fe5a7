//! Minimal async client for S3-compatible object storage.
//!
//! Objects are addressed by `(bucket, key)` pairs with path-style URLs
//! (`https://s3.amazonaws.com/<bucket>/<key>`). Each operation issues exactly
//! one signed HTTP request; failures surface as [`S3Error`] and nothing is
//! retried.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use s3_mini::{Connection, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), s3_mini::S3Error> {
//!     let config = ConnectionConfig::builder()
//!         .credentials("AKID", "SECRET")
//!         .default_bucket("my-bucket")
//!         .build()?;
//!     let connection = Connection::builder().config(config).build()?;
//!
//!     connection.upload("hello.txt", "Hello, S3!", None).await?;
//!     let object = connection.get("hello.txt", None).await?;
//!     println!("{}", object.text());
//!
//!     connection.get_to_file("hello.txt", "/tmp/hello.txt", None).await?;
//!     connection.delete("hello.txt", None).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mocks;
pub mod services;
pub mod signing;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{Connection, ConnectionBuilder};
pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use credentials::{
    AwsCredentials, CredentialsProvider, EnvCredentialsProvider, StaticCredentialsProvider,
};
pub use error::{
    AccessError, BucketError, ConfigurationError, CredentialsError, NetworkError, ObjectError,
    RequestError, ResponseError, S3Error, ServerError, SigningError, TransferError,
};
pub use services::ObjectsService;
pub use signing::{AwsSigner, AwsSignerV4};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    // Request types
    CopyObjectRequest,
    DeleteObjectRequest,
    GetObjectRequest,
    HeadObjectRequest,
    ListObjectsRequest,
    UpdateMetadataRequest,
    UploadObjectRequest,
    // Response types
    CopyObjectOutput,
    DeleteObjectOutput,
    GetObjectOutput,
    HeadObjectOutput,
    ListObjectsOutput,
    ObjectInfo,
    ObjectResponse,
    ObjectStream,
    UpdateMetadataOutput,
    UploadObjectOutput,
    // Common types
    CannedAcl,
    Expires,
    MetadataDirective,
    S3Object,
    StorageClass,
};

/// Create a connection configured from environment variables.
///
/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`
/// for credentials, `AWS_REGION` / `AWS_DEFAULT_REGION` for the signing
/// region, and `S3_ENDPOINT`, `S3_DEFAULT_BUCKET` and `S3_TLS`.
///
/// ```rust,no_run
/// let connection = s3_mini::connect_from_env()?;
/// # Ok::<(), s3_mini::S3Error>(())
/// ```
pub fn connect_from_env() -> Result<Connection> {
    ConnectionBuilder::new().from_env().build()
}

/// Result type alias for S3 operations.
pub type Result<T> = std::result::Result<T, S3Error>;
