//! Error types for the S3 client.
//!
//! Errors are grouped by where they originate: local configuration and
//! signing, the transport, or a non-success response from the object store.
//! Every operation either returns its output or one of these errors; there is
//! no retry layer in between.

mod mapping;

pub use mapping::{map_s3_error_code, map_status, S3ErrorResponse};

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the S3 client.
#[derive(Debug, Error)]
pub enum S3Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential-related errors.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Request signing errors.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Request validation errors.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Bucket errors reported by the server.
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),

    /// Object errors reported by the server.
    #[error("Object error: {0}")]
    Object(#[from] ObjectError),

    /// Access and authorization errors.
    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    /// Network and transport errors.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Server-side errors.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Response handling errors.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Download and local file errors.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl S3Error {
    /// Returns the HTTP status code this error corresponds to, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            S3Error::Access(_) => Some(403),
            S3Error::Bucket(BucketError::NotFound { .. }) => Some(404),
            S3Error::Object(ObjectError::NotFound { .. }) => Some(404),
            S3Error::Object(ObjectError::PreconditionFailed { .. }) => Some(412),
            S3Error::Object(ObjectError::InvalidState { .. }) => Some(403),
            S3Error::Server(ServerError::InternalError { .. }) => Some(500),
            S3Error::Server(ServerError::ServiceUnavailable { .. }) => Some(503),
            S3Error::Server(ServerError::SlowDown { .. }) => Some(503),
            S3Error::Response(ResponseError::UnexpectedStatus { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Returns the S3 error code if available.
    pub fn s3_error_code(&self) -> Option<&str> {
        match self {
            S3Error::Bucket(e) => Some(e.code()),
            S3Error::Object(e) => Some(e.code()),
            S3Error::Access(e) => Some(e.code()),
            S3Error::Server(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            S3Error::Bucket(e) => e.request_id(),
            S3Error::Object(e) => e.request_id(),
            S3Error::Access(e) => e.request_id(),
            S3Error::Server(e) => e.request_id(),
            _ => None,
        }
    }

    /// Returns true if the object or bucket addressed by the request does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            S3Error::Object(ObjectError::NotFound { .. })
                | S3Error::Bucket(BucketError::NotFound { .. })
        )
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No bucket was given and the connection has no default bucket.
    #[error("Missing bucket: no bucket given and no default bucket configured")]
    MissingBucket,

    /// Invalid endpoint.
    #[error("Invalid endpoint '{endpoint}': {details}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
        /// Details about the validation error.
        details: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// Credential-related errors.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// No credentials could be found.
    #[error("Credentials not found: {source_name} did not provide credentials")]
    NotFound {
        /// Name of the provider that was consulted.
        source_name: String,
    },

    /// Credentials have expired.
    #[error("Credentials expired: session credentials expired at {expiration}")]
    Expired {
        /// When the credentials expired.
        expiration: String,
    },

    /// Credentials are invalid.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Details about why credentials are invalid.
        message: String,
    },
}

/// Request signing errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Signature calculation failed.
    #[error("Signature calculation failed: {message}")]
    CalculationFailed {
        /// Details about the calculation error.
        message: String,
    },
}

/// Request validation errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// General validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Details about the validation error.
        message: String,
    },

    /// Invalid object key.
    #[error("Invalid object key '{key}': {reason}")]
    InvalidObjectKey {
        /// The invalid object key.
        key: String,
        /// Reason why the key is invalid.
        reason: String,
    },
}

/// Bucket errors.
#[derive(Debug, Error)]
pub enum BucketError {
    /// Bucket not found.
    #[error("Bucket not found: '{bucket}'")]
    NotFound {
        /// The bucket name.
        bucket: String,
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl BucketError {
    /// Returns the S3 error code.
    pub fn code(&self) -> &str {
        match self {
            BucketError::NotFound { .. } => "NoSuchBucket",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            BucketError::NotFound { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// Object errors.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Object not found.
    #[error("Object not found: '{bucket}/{key}'")]
    NotFound {
        /// The bucket name.
        bucket: String,
        /// The object key.
        key: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Precondition failed (If-Match, etc.).
    #[error("Precondition failed for '{bucket}/{key}': {condition}")]
    PreconditionFailed {
        /// The bucket name.
        bucket: String,
        /// The object key.
        key: String,
        /// The condition that failed.
        condition: String,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Invalid object state (e.g. archived object that must be restored first).
    #[error("Invalid object state for '{bucket}/{key}': {message}")]
    InvalidState {
        /// The bucket name.
        bucket: String,
        /// The object key.
        key: String,
        /// Error message.
        message: String,
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl ObjectError {
    /// Returns the S3 error code.
    pub fn code(&self) -> &str {
        match self {
            ObjectError::NotFound { .. } => "NoSuchKey",
            ObjectError::PreconditionFailed { .. } => "PreconditionFailed",
            ObjectError::InvalidState { .. } => "InvalidObjectState",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ObjectError::NotFound { request_id, .. }
            | ObjectError::PreconditionFailed { request_id, .. }
            | ObjectError::InvalidState { request_id, .. } => request_id.as_deref(),
        }
    }
}

/// Access and authorization errors.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Access denied.
    #[error("Access denied")]
    AccessDenied {
        /// Additional message if available.
        message: Option<String>,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Invalid access key ID.
    #[error("Invalid access key ID")]
    InvalidAccessKeyId {
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Signature does not match.
    #[error("Signature does not match")]
    SignatureDoesNotMatch {
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Expired token.
    #[error("Token has expired")]
    ExpiredToken {
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl AccessError {
    /// Returns the S3 error code.
    pub fn code(&self) -> &str {
        match self {
            AccessError::AccessDenied { .. } => "AccessDenied",
            AccessError::InvalidAccessKeyId { .. } => "InvalidAccessKeyId",
            AccessError::SignatureDoesNotMatch { .. } => "SignatureDoesNotMatch",
            AccessError::ExpiredToken { .. } => "ExpiredToken",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            AccessError::AccessDenied { request_id, .. }
            | AccessError::InvalidAccessKeyId { request_id }
            | AccessError::SignatureDoesNotMatch { request_id }
            | AccessError::ExpiredToken { request_id } => request_id.as_deref(),
        }
    }
}

/// Network and transport errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    TlsError {
        /// Error message.
        message: String,
    },
}

/// Server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Internal server error (500).
    #[error("Internal server error")]
    InternalError {
        /// Error message.
        message: Option<String>,
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Service unavailable (503).
    #[error("Service unavailable")]
    ServiceUnavailable {
        /// AWS request ID.
        request_id: Option<String>,
    },

    /// Slow down (503).
    #[error("Slow down - reduce request rate")]
    SlowDown {
        /// AWS request ID.
        request_id: Option<String>,
    },
}

impl ServerError {
    /// Returns the S3 error code.
    pub fn code(&self) -> &str {
        match self {
            ServerError::InternalError { .. } => "InternalError",
            ServerError::ServiceUnavailable { .. } => "ServiceUnavailable",
            ServerError::SlowDown { .. } => "SlowDown",
        }
    }

    /// Returns the AWS request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ServerError::InternalError { request_id, .. }
            | ServerError::ServiceUnavailable { request_id }
            | ServerError::SlowDown { request_id } => request_id.as_deref(),
        }
    }
}

/// Response handling errors.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// XML parse error.
    #[error("XML parse error: {message}")]
    XmlParseError {
        /// Error message.
        message: String,
    },

    /// Non-success status that carried no recognizable S3 error.
    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Error code or body excerpt.
        message: String,
    },

    /// Invalid response format.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

/// Download and local file errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading or writing a local file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The local path involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Response body stream broke off.
    #[error("Stream interrupted after {bytes_transferred} bytes: {message}")]
    StreamInterrupted {
        /// Bytes successfully transferred before interruption.
        bytes_transferred: u64,
        /// Error message.
        message: String,
    },
}
