//! Request types for S3 operations.
//!
//! Each request is built for one call and consumed by the objects service.

use super::common::*;
use crate::signing::uri_encode_path;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Request to download an object.
#[derive(Debug, Clone)]
pub struct GetObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Return the body as an unread stream instead of buffering it.
    pub stream: bool,
    /// Write the body to this file instead of returning it.
    pub destination: Option<PathBuf>,
}

impl GetObjectRequest {
    /// Create a new get object request.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            stream: false,
            destination: None,
        }
    }

    /// Leave the body unread in the response.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Save the body to a local file.
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }
}

/// Request to delete an object.
#[derive(Debug, Clone)]
pub struct DeleteObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl DeleteObjectRequest {
    /// Create a new delete object request.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Request to copy an object.
#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    /// Source bucket.
    pub source_bucket: String,
    /// Source key.
    pub source_key: String,
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// Replacement metadata; when set the copy replaces metadata instead of copying it.
    pub metadata: Option<HashMap<String, String>>,
    /// Make the copy publicly readable.
    pub public: bool,
}

impl CopyObjectRequest {
    /// Create a new copy object request.
    pub fn new(
        source_bucket: impl Into<String>,
        source_key: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            source_key: source_key.into(),
            bucket: bucket.into(),
            key: key.into(),
            metadata: None,
            public: false,
        }
    }

    /// Replace the metadata of the copy.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set the public flag.
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Value of the `x-amz-copy-source` header, key URL-encoded.
    pub fn copy_source(&self) -> String {
        let key = self.source_key.strip_prefix('/').unwrap_or(&self.source_key);
        format!("/{}/{}", self.source_bucket, uri_encode_path(key))
    }

    /// Directive implied by the presence of replacement metadata.
    pub fn metadata_directive(&self) -> MetadataDirective {
        if self.metadata.is_some() {
            MetadataDirective::Replace
        } else {
            MetadataDirective::Copy
        }
    }
}

/// Request to replace the metadata of an object in place.
///
/// Entries in `metadata` are sent as request headers with their names
/// unchanged, so callers pass `x-amz-meta-*` names for user metadata and
/// plain names such as `Content-Type` for system metadata.
#[derive(Debug, Clone)]
pub struct UpdateMetadataRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Headers describing the new metadata.
    pub metadata: HashMap<String, String>,
    /// Make the object publicly readable.
    pub public: bool,
}

impl UpdateMetadataRequest {
    /// Create a new update metadata request.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            metadata: HashMap::new(),
            public: false,
        }
    }

    /// Add a metadata header.
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Add several metadata headers.
    pub fn with_metadata_map(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata.extend(metadata);
        self
    }

    /// Set the public flag.
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Value of the `x-amz-copy-source` header: the object itself.
    pub fn copy_source(&self) -> String {
        let key = self.key.strip_prefix('/').unwrap_or(&self.key);
        format!("/{}/{}", self.bucket, uri_encode_path(key))
    }
}

/// Request to upload an object.
#[derive(Debug, Clone)]
pub struct UploadObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object body.
    pub body: Bytes,
    /// Content type; guessed from the key when absent.
    pub content_type: Option<String>,
    /// Make the object publicly readable. Defaults to `true`.
    pub public: bool,
    /// Cache lifetime sent as `Cache-Control`.
    pub expires: Option<Expires>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// Extra headers, sent last so they override computed ones.
    pub headers: HashMap<String, String>,
}

impl UploadObjectRequest {
    /// Create a new upload request.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            body: body.into(),
            content_type: None,
            public: true,
            expires: None,
            storage_class: None,
            headers: HashMap::new(),
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the public flag.
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Set the cache lifetime.
    pub fn with_expires(mut self, expires: impl Into<Expires>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    /// Cache for the given duration.
    pub fn with_max_age(self, max_age: Duration) -> Self {
        self.with_expires(Expires::After(max_age))
    }

    /// Store with reduced redundancy.
    pub fn with_reduced_redundancy(mut self, reduced: bool) -> Self {
        self.storage_class = reduced.then_some(StorageClass::ReducedRedundancy);
        self
    }

    /// Set the storage class.
    pub fn with_storage_class(mut self, storage_class: StorageClass) -> Self {
        self.storage_class = Some(storage_class);
        self
    }

    /// Add an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Content type to send: explicit, else guessed from the key, else binary.
    pub fn resolved_content_type(&self) -> String {
        match &self.content_type {
            Some(content_type) => content_type.clone(),
            None => mime_guess::from_path(&self.key)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}

/// Request to fetch object metadata.
#[derive(Debug, Clone)]
pub struct HeadObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl HeadObjectRequest {
    /// Create a new head object request.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Request to list objects (ListObjectsV2).
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Only keys starting with this prefix.
    pub prefix: Option<String>,
    /// Maximum keys per page.
    pub max_keys: Option<u32>,
    /// Token from a previous truncated page.
    pub continuation_token: Option<String>,
}

impl ListObjectsRequest {
    /// Create a new list request.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the page size.
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    /// Continue from a previous page.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Query parameters in request order.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("list-type", "2".to_string())];
        if let Some(token) = &self.continuation_token {
            params.push(("continuation-token", token.clone()));
        }
        if let Some(max_keys) = self.max_keys {
            params.push(("max-keys", max_keys.to_string()));
        }
        if let Some(prefix) = &self.prefix {
            params.push(("prefix", prefix.clone()));
        }
        params
    }
}
