//! Common enums and data types for S3.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds in the `Max` expiry (one year).
pub const MAX_EXPIRES_SECS: u64 = 31_536_000;

/// S3 storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    /// Standard storage.
    #[default]
    Standard,
    /// Reduced redundancy storage.
    ReducedRedundancy,
}

impl StorageClass {
    /// Returns the S3 API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
        }
    }
}

impl std::str::FromStr for StorageClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(StorageClass::Standard),
            "REDUCED_REDUNDANCY" => Ok(StorageClass::ReducedRedundancy),
            _ => Err(format!("Unknown storage class: {}", s)),
        }
    }
}

/// Canned ACL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CannedAcl {
    /// Owner gets FULL_CONTROL. No one else has access rights.
    #[default]
    Private,
    /// Owner gets FULL_CONTROL. Everyone else gets READ access.
    PublicRead,
}

impl CannedAcl {
    /// Returns the S3 API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }

    /// `PublicRead` when `public` is set, otherwise `None` (bucket default applies).
    pub fn from_public_flag(public: bool) -> Option<Self> {
        public.then_some(CannedAcl::PublicRead)
    }
}

/// Client-side cache lifetime of an uploaded object.
///
/// Sent as `Cache-Control: max-age=<seconds>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expires {
    /// A fixed lifetime.
    After(Duration),
    /// One year.
    Max,
}

impl Expires {
    /// Lifetime in whole seconds.
    pub fn as_secs(&self) -> u64 {
        match self {
            Expires::After(duration) => duration.as_secs(),
            Expires::Max => MAX_EXPIRES_SECS,
        }
    }

    /// `Cache-Control` header value.
    pub fn cache_control(&self) -> String {
        format!("max-age={}", self.as_secs())
    }
}

impl From<Duration> for Expires {
    fn from(duration: Duration) -> Self {
        Expires::After(duration)
    }
}

/// Metadata directive for copy requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataDirective {
    /// Keep the source object's metadata.
    #[default]
    Copy,
    /// Replace metadata with the headers sent on the request.
    Replace,
}

impl MetadataDirective {
    /// Returns the S3 API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataDirective::Copy => "COPY",
            MetadataDirective::Replace => "REPLACE",
        }
    }
}

/// An object entry in a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct S3Object {
    /// Object key.
    pub key: String,
    /// Last modified timestamp as sent by the server.
    pub last_modified: Option<String>,
    /// ETag.
    pub e_tag: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Storage class.
    pub storage_class: Option<String>,
}
