//! Mapping of failed S3 responses to typed errors.

use super::*;

/// Parsed S3 error response body.
#[derive(Debug, Clone, Default)]
pub struct S3ErrorResponse {
    /// S3 error code (e.g., "NoSuchKey").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Affected bucket, if any.
    pub bucket: Option<String>,
    /// Affected key, if any.
    pub key: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
    /// Extended request ID.
    pub host_id: Option<String>,
}

/// Map an S3 error body to a typed error.
///
/// `status` is used for codes this client does not model, so the caller
/// still sees which status the server answered with.
pub fn map_s3_error_code(status: u16, resp: S3ErrorResponse) -> S3Error {
    let message = if resp.message.is_empty() {
        None
    } else {
        Some(resp.message.clone())
    };

    match resp.code.as_str() {
        "NoSuchBucket" => S3Error::Bucket(BucketError::NotFound {
            bucket: resp.bucket.unwrap_or_default(),
            request_id: resp.request_id,
        }),

        "NoSuchKey" => S3Error::Object(ObjectError::NotFound {
            bucket: resp.bucket.unwrap_or_default(),
            key: resp.key.unwrap_or_default(),
            request_id: resp.request_id,
        }),
        "PreconditionFailed" => S3Error::Object(ObjectError::PreconditionFailed {
            bucket: resp.bucket.unwrap_or_default(),
            key: resp.key.unwrap_or_default(),
            condition: resp.message,
            request_id: resp.request_id,
        }),
        "InvalidObjectState" => S3Error::Object(ObjectError::InvalidState {
            bucket: resp.bucket.unwrap_or_default(),
            key: resp.key.unwrap_or_default(),
            message: resp.message,
            request_id: resp.request_id,
        }),

        "AccessDenied" | "AllAccessDisabled" => S3Error::Access(AccessError::AccessDenied {
            message,
            request_id: resp.request_id,
        }),
        "InvalidAccessKeyId" => S3Error::Access(AccessError::InvalidAccessKeyId {
            request_id: resp.request_id,
        }),
        "SignatureDoesNotMatch" => S3Error::Access(AccessError::SignatureDoesNotMatch {
            request_id: resp.request_id,
        }),
        "ExpiredToken" | "TokenRefreshRequired" => S3Error::Access(AccessError::ExpiredToken {
            request_id: resp.request_id,
        }),

        "InternalError" => S3Error::Server(ServerError::InternalError {
            message,
            request_id: resp.request_id,
        }),
        "ServiceUnavailable" => S3Error::Server(ServerError::ServiceUnavailable {
            request_id: resp.request_id,
        }),
        "SlowDown" => S3Error::Server(ServerError::SlowDown {
            request_id: resp.request_id,
        }),

        "InvalidRequest" | "InvalidArgument" | "MalformedXML" => {
            S3Error::Request(RequestError::Validation {
                message: resp.message,
            })
        }

        _ => S3Error::Response(ResponseError::UnexpectedStatus {
            status,
            message: match message {
                Some(m) => format!("{}: {}", resp.code, m),
                None => resp.code,
            },
        }),
    }
}

/// Map a bare HTTP status to an error when the body carries no S3 error.
///
/// HEAD responses never have a body, so this is the only information
/// available for them.
pub fn map_status(status: u16, bucket: &str, key: &str, request_id: Option<String>) -> S3Error {
    match status {
        403 => S3Error::Access(AccessError::AccessDenied {
            message: None,
            request_id,
        }),
        404 => S3Error::Object(ObjectError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
            request_id,
        }),
        412 => S3Error::Object(ObjectError::PreconditionFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            condition: "Precondition failed".to_string(),
            request_id,
        }),
        500 => S3Error::Server(ServerError::InternalError {
            message: None,
            request_id,
        }),
        503 => S3Error::Server(ServerError::ServiceUnavailable { request_id }),
        _ => S3Error::Response(ResponseError::UnexpectedStatus {
            status,
            message: format!("HTTP status {}", status),
        }),
    }
}
