//! Response types for S3 operations.

use super::common::*;
use crate::error::{S3Error, TransferError};
use crate::transport::ByteStream;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio_util::io::StreamReader;

/// Prefix of user metadata headers.
pub const METADATA_PREFIX: &str = "x-amz-meta-";

/// Object attributes carried in response headers.
#[derive(Debug, Clone, Default)]
pub struct ObjectInfo {
    /// ETag.
    pub e_tag: Option<String>,
    /// Content length.
    pub content_length: Option<u64>,
    /// Content type.
    pub content_type: Option<String>,
    /// Cache control.
    pub cache_control: Option<String>,
    /// Last modified.
    pub last_modified: Option<String>,
    /// Version ID.
    pub version_id: Option<String>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// User metadata, keyed without the `x-amz-meta-` prefix.
    pub metadata: HashMap<String, String>,
    /// AWS request ID.
    pub request_id: Option<String>,
    /// All response headers, names lowercased.
    pub headers: HashMap<String, String>,
}

impl ObjectInfo {
    /// Extract object attributes from response headers.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let headers: HashMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect();
        let get = |name: &str| headers.get(name).cloned();

        let metadata = headers
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(METADATA_PREFIX)
                    .map(|name| (name.to_string(), v.clone()))
            })
            .collect();

        Self {
            e_tag: get("etag"),
            content_length: headers.get("content-length").and_then(|v| v.parse().ok()),
            content_type: get("content-type"),
            cache_control: get("cache-control"),
            last_modified: get("last-modified"),
            version_id: get("x-amz-version-id"),
            storage_class: headers
                .get("x-amz-storage-class")
                .and_then(|v| v.parse().ok()),
            metadata,
            request_id: get("x-amz-request-id"),
            headers,
        }
    }
}

/// Output of a head object call.
pub type HeadObjectOutput = ObjectInfo;

/// Object downloaded into memory.
#[derive(Debug, Clone)]
pub struct ObjectResponse {
    /// Object attributes.
    pub info: ObjectInfo,
    /// Object body.
    pub body: Bytes,
}

impl ObjectResponse {
    /// Body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Object whose body has not been read yet.
pub struct ObjectStream {
    /// Object attributes.
    pub info: ObjectInfo,
    body: ByteStream,
}

impl ObjectStream {
    /// Wrap a response body stream.
    pub fn new(info: ObjectInfo, body: ByteStream) -> Self {
        Self { info, body }
    }

    /// Take the raw chunk stream.
    pub fn into_stream(self) -> ByteStream {
        self.body
    }

    /// Adapt the body to `AsyncRead`.
    pub fn into_async_read(self) -> impl tokio::io::AsyncBufRead + Send + Unpin {
        StreamReader::new(self.body.map_err(|e| match e {
            S3Error::Transfer(TransferError::Io { source, .. }) => source,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        }))
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> Result<ObjectResponse, S3Error> {
        let mut body = BytesMut::new();
        let mut stream = self.body;
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }
        Ok(ObjectResponse {
            info: self.info,
            body: body.freeze(),
        })
    }
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Response from get object operation.
#[derive(Debug)]
pub enum GetObjectOutput {
    /// Body read into memory.
    Buffered(ObjectResponse),
    /// Body left on the wire.
    Streaming(ObjectStream),
    /// Body written to a local file.
    Saved {
        /// Destination path.
        path: PathBuf,
        /// Bytes written to the file.
        bytes_written: u64,
        /// Object attributes.
        info: ObjectInfo,
    },
}

impl GetObjectOutput {
    /// Object attributes.
    pub fn info(&self) -> &ObjectInfo {
        match self {
            GetObjectOutput::Buffered(response) => &response.info,
            GetObjectOutput::Streaming(stream) => &stream.info,
            GetObjectOutput::Saved { info, .. } => info,
        }
    }

    /// Path of the saved file, when the body went to disk.
    pub fn saved_path(&self) -> Option<&Path> {
        match self {
            GetObjectOutput::Saved { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Body bytes, reading a stream to the end if needed.
    ///
    /// Fails for a body that was saved to disk.
    pub async fn into_bytes(self) -> Result<Bytes, S3Error> {
        match self {
            GetObjectOutput::Buffered(response) => Ok(response.body),
            GetObjectOutput::Streaming(stream) => Ok(stream.collect().await?.body),
            GetObjectOutput::Saved { path, .. } => Err(S3Error::Response(
                crate::error::ResponseError::InvalidResponse {
                    message: format!("body was saved to {}", path.display()),
                },
            )),
        }
    }
}

/// Response from delete object operation.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectOutput {
    /// Whether a delete marker was created.
    pub delete_marker: Option<bool>,
    /// Version ID.
    pub version_id: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
}

/// Response from copy object operation.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectOutput {
    /// ETag of the new object.
    pub e_tag: Option<String>,
    /// Last modified.
    pub last_modified: Option<String>,
    /// Version ID of the new object.
    pub version_id: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
}

/// Response from update metadata operation (an in-place copy).
pub type UpdateMetadataOutput = CopyObjectOutput;

/// Response from upload operation.
#[derive(Debug, Clone)]
pub struct UploadObjectOutput {
    /// URL of the uploaded object.
    pub url: String,
    /// ETag of the uploaded object.
    pub e_tag: Option<String>,
    /// Version ID if versioning enabled.
    pub version_id: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
}

/// Response from list objects operation.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsOutput {
    /// Bucket name.
    pub name: Option<String>,
    /// Prefix.
    pub prefix: Option<String>,
    /// Key count on this page.
    pub key_count: Option<u32>,
    /// Max keys.
    pub max_keys: Option<u32>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Objects on this page.
    pub contents: Vec<S3Object>,
    /// Token this page was requested with.
    pub continuation_token: Option<String>,
    /// Token for the next page.
    pub next_continuation_token: Option<String>,
    /// AWS request ID.
    pub request_id: Option<String>,
}
