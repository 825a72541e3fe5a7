//! Objects service: one executor per object operation.
//!
//! Every executor builds the object URL, attaches its headers, signs the
//! request and issues exactly one HTTP call. Non-2xx responses become typed
//! errors; nothing is retried.

use crate::config::ConnectionConfig;
use crate::error::{
    map_s3_error_code, map_status, RequestError, S3Error, S3ErrorResponse, TransferError,
};
use crate::signing::{uri_encode, uri_encode_path, AwsSigner};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, StreamingHttpResponse};
use crate::types::*;
use crate::xml;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use url::Url;

/// Service for S3 object operations.
pub struct ObjectsService {
    config: Arc<ConnectionConfig>,
    transport: Arc<dyn HttpTransport>,
    signer: Arc<dyn AwsSigner>,
}

impl ObjectsService {
    /// Create a new objects service.
    pub fn new(
        config: Arc<ConnectionConfig>,
        transport: Arc<dyn HttpTransport>,
        signer: Arc<dyn AwsSigner>,
    ) -> Self {
        Self {
            config,
            transport,
            signer,
        }
    }

    /// Configuration this service builds URLs from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get an object.
    ///
    /// With a destination the body is written to that file line by line and
    /// the path is returned. Without one the body is buffered, or left
    /// unread when `stream` is set.
    pub async fn get(&self, request: GetObjectRequest) -> Result<GetObjectOutput, S3Error> {
        let url = self.build_url(&request.bucket, &request.key)?;

        if !request.stream && request.destination.is_none() {
            let response = self
                .dispatch("GET", url, HashMap::new(), None, &request.bucket, &request.key)
                .await?;
            return Ok(GetObjectOutput::Buffered(ObjectResponse {
                info: ObjectInfo::from_headers(&response.headers),
                body: response.body,
            }));
        }

        let response = self
            .dispatch_streaming("GET", url, &request.bucket, &request.key)
            .await?;
        let info = ObjectInfo::from_headers(&response.headers);
        let stream = ObjectStream::new(info, response.body);

        match request.destination {
            Some(path) => {
                let info = stream.info.clone();
                let bytes_written = save_lines(&path, stream).await?;
                debug!(
                    path = %path.display(),
                    bytes = bytes_written,
                    "Saved object to file"
                );
                Ok(GetObjectOutput::Saved {
                    path,
                    bytes_written,
                    info,
                })
            }
            None => Ok(GetObjectOutput::Streaming(stream)),
        }
    }

    /// Delete an object.
    pub async fn delete(&self, request: DeleteObjectRequest) -> Result<DeleteObjectOutput, S3Error> {
        let url = self.build_url(&request.bucket, &request.key)?;

        let response = self
            .dispatch("DELETE", url, HashMap::new(), None, &request.bucket, &request.key)
            .await?;

        Ok(DeleteObjectOutput {
            delete_marker: response
                .get_header("x-amz-delete-marker")
                .map(|v| v == "true"),
            version_id: response.get_header("x-amz-version-id").map(String::from),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Copy an object.
    pub async fn copy(&self, request: CopyObjectRequest) -> Result<CopyObjectOutput, S3Error> {
        validate_location(&request.source_bucket, &request.source_key)?;
        let url = self.build_url(&request.bucket, &request.key)?;

        let mut headers = HashMap::new();
        headers.insert("x-amz-copy-source".to_string(), request.copy_source());
        headers.insert(
            "x-amz-metadata-directive".to_string(),
            request.metadata_directive().as_str().to_string(),
        );
        if let Some(acl) = CannedAcl::from_public_flag(request.public) {
            headers.insert("x-amz-acl".to_string(), acl.as_str().to_string());
        }
        if let Some(metadata) = &request.metadata {
            merge_headers(&mut headers, metadata);
        }

        let response = self
            .dispatch("PUT", url, headers, None, &request.bucket, &request.key)
            .await?;

        copy_output(response)
    }

    /// Replace the metadata of an object by copying it onto itself.
    pub async fn update_metadata(
        &self,
        request: UpdateMetadataRequest,
    ) -> Result<UpdateMetadataOutput, S3Error> {
        let url = self.build_url(&request.bucket, &request.key)?;

        let mut headers = HashMap::new();
        headers.insert("x-amz-copy-source".to_string(), request.copy_source());
        headers.insert(
            "x-amz-metadata-directive".to_string(),
            MetadataDirective::Replace.as_str().to_string(),
        );
        if let Some(acl) = CannedAcl::from_public_flag(request.public) {
            headers.insert("x-amz-acl".to_string(), acl.as_str().to_string());
        }
        merge_headers(&mut headers, &request.metadata);

        let response = self
            .dispatch("PUT", url, headers, None, &request.bucket, &request.key)
            .await?;

        copy_output(response)
    }

    /// Upload an object.
    pub async fn upload(&self, request: UploadObjectRequest) -> Result<UploadObjectOutput, S3Error> {
        let url = self.build_url(&request.bucket, &request.key)?;
        let object_url = url.to_string();

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), request.resolved_content_type());
        if let Some(acl) = CannedAcl::from_public_flag(request.public) {
            headers.insert("x-amz-acl".to_string(), acl.as_str().to_string());
        }
        if let Some(expires) = &request.expires {
            headers.insert("cache-control".to_string(), expires.cache_control());
        }
        if let Some(storage_class) = &request.storage_class {
            headers.insert(
                "x-amz-storage-class".to_string(),
                storage_class.as_str().to_string(),
            );
        }
        merge_headers(&mut headers, &request.headers);
        headers.insert("content-length".to_string(), request.body.len().to_string());

        let response = self
            .dispatch(
                "PUT",
                url,
                headers,
                Some(request.body),
                &request.bucket,
                &request.key,
            )
            .await?;

        Ok(UploadObjectOutput {
            url: object_url,
            e_tag: response.etag().map(String::from),
            version_id: response.get_header("x-amz-version-id").map(String::from),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Fetch object metadata without the body.
    pub async fn head(&self, request: HeadObjectRequest) -> Result<HeadObjectOutput, S3Error> {
        let url = self.build_url(&request.bucket, &request.key)?;

        let response = self
            .dispatch("HEAD", url, HashMap::new(), None, &request.bucket, &request.key)
            .await?;

        Ok(ObjectInfo::from_headers(&response.headers))
    }

    /// List one page of objects.
    pub async fn list(&self, request: ListObjectsRequest) -> Result<ListObjectsOutput, S3Error> {
        if request.bucket.is_empty() {
            return Err(S3Error::Request(RequestError::Validation {
                message: "Bucket name must not be empty".to_string(),
            }));
        }

        let mut url = parse_url(&self.config.bucket_url("", &request.bucket))?;
        let query = request
            .query_params()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, uri_encode(&value)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));

        let response = self
            .dispatch("GET", url, HashMap::new(), None, &request.bucket, "")
            .await?;

        let body = String::from_utf8_lossy(&response.body);
        let mut output = xml::parse_list_objects_v2(&body)?;
        output.request_id = response.request_id().map(String::from);

        Ok(output)
    }

    /// List every object, following continuation tokens page by page.
    pub async fn list_all(&self, request: ListObjectsRequest) -> Result<Vec<S3Object>, S3Error> {
        let mut objects = Vec::new();
        let mut page_request = request;

        loop {
            let page = self.list(page_request.clone()).await?;
            objects.extend(page.contents);

            match page.next_continuation_token {
                Some(token) if page.is_truncated => {
                    page_request = page_request.with_continuation_token(token);
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    fn build_url(&self, bucket: &str, key: &str) -> Result<Url, S3Error> {
        validate_location(bucket, key)?;
        parse_url(&self.config.bucket_url(&uri_encode_path(key), bucket))
    }

    async fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &HashMap<String, String>,
        body: Option<&Bytes>,
    ) -> Result<HttpRequest, S3Error> {
        let signed = self
            .signer
            .sign(method, url, headers, body.map(|b| &b[..]))
            .await?;

        let request = HttpRequest::new(signed.method, signed.url.as_str()).with_headers(signed.headers);
        Ok(match body {
            Some(body) => request.with_body(body.clone()),
            None => request,
        })
    }

    async fn dispatch(
        &self,
        method: &str,
        url: Url,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
        bucket: &str,
        key: &str,
    ) -> Result<HttpResponse, S3Error> {
        let request = self.sign(method, &url, &headers, body.as_ref()).await?;

        debug!(method, bucket, key, url = %url, "Sending S3 request");
        let response = self.transport.send(request).await?;
        debug!(method, status = response.status, "Received S3 response");

        if !response.is_success() {
            return Err(self.failure(method, &response, bucket, key));
        }

        Ok(response)
    }

    async fn dispatch_streaming(
        &self,
        method: &str,
        url: Url,
        bucket: &str,
        key: &str,
    ) -> Result<StreamingHttpResponse, S3Error> {
        let request = self.sign(method, &url, &HashMap::new(), None).await?;

        debug!(method, bucket, key, url = %url, "Sending S3 request (streamed response)");
        let response = self.transport.send_streaming(request).await?;
        debug!(method, status = response.status, "Received S3 response");

        if !response.is_success() {
            let response = response.into_buffered().await?;
            return Err(self.failure(method, &response, bucket, key));
        }

        Ok(response)
    }

    fn failure(&self, method: &str, response: &HttpResponse, bucket: &str, key: &str) -> S3Error {
        let error = error_from_response(response, bucket, key);
        warn!(
            method,
            bucket,
            key,
            status = response.status,
            code = error.s3_error_code().unwrap_or("-"),
            "S3 request failed"
        );
        error
    }
}

impl std::fmt::Debug for ObjectsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectsService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate_location(bucket: &str, key: &str) -> Result<(), S3Error> {
    if bucket.is_empty() {
        return Err(S3Error::Request(RequestError::Validation {
            message: "Bucket name must not be empty".to_string(),
        }));
    }
    if key.is_empty() || key == "/" {
        return Err(S3Error::Request(RequestError::InvalidObjectKey {
            key: key.to_string(),
            reason: "Object key must not be empty".to_string(),
        }));
    }
    // URL parsing collapses dot segments, which would address another object.
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(S3Error::Request(RequestError::InvalidObjectKey {
            key: key.to_string(),
            reason: "Object key must not contain '.' or '..' segments".to_string(),
        }));
    }
    Ok(())
}

fn parse_url(url: &str) -> Result<Url, S3Error> {
    Url::parse(url).map_err(|e| {
        S3Error::Request(RequestError::Validation {
            message: format!("Invalid URL '{}': {}", url, e),
        })
    })
}

/// Insert caller headers, replacing computed ones that differ only in case.
fn merge_headers(headers: &mut HashMap<String, String>, extra: &HashMap<String, String>) {
    for (name, value) in extra {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
}

fn error_from_response(response: &HttpResponse, bucket: &str, key: &str) -> S3Error {
    let request_id = response.request_id().map(String::from);

    if response.body.is_empty() {
        return map_status(response.status, bucket, key, request_id);
    }

    let body = String::from_utf8_lossy(&response.body);
    match xml::parse_error_response(&body) {
        Ok(parsed) => map_s3_error_code(response.status, fill_location(parsed, bucket, key)),
        Err(_) => map_status(response.status, bucket, key, request_id),
    }
}

fn fill_location(mut parsed: S3ErrorResponse, bucket: &str, key: &str) -> S3ErrorResponse {
    parsed.bucket.get_or_insert_with(|| bucket.to_string());
    parsed.key.get_or_insert_with(|| key.to_string());
    parsed
}

fn copy_output(response: HttpResponse) -> Result<CopyObjectOutput, S3Error> {
    let body = String::from_utf8_lossy(&response.body);
    let result = match xml::parse_copy_object_result(&body)? {
        Ok(result) => result,
        Err(embedded) => return Err(map_s3_error_code(response.status, embedded)),
    };

    Ok(CopyObjectOutput {
        e_tag: result.e_tag.or_else(|| response.etag().map(String::from)),
        last_modified: result
            .last_modified
            .or_else(|| response.get_header("last-modified").map(String::from)),
        version_id: response.get_header("x-amz-version-id").map(String::from),
        request_id: response.request_id().map(String::from),
    })
}

/// Write a response body to `path` one line at a time.
///
/// Lines keep their terminators, so the file matches the body byte for byte.
/// A partially written file is removed when the download fails.
async fn save_lines(path: &Path, stream: ObjectStream) -> Result<u64, S3Error> {
    let result = write_lines(path, stream).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partial download");
        }
    }
    result
}

async fn write_lines(path: &Path, stream: ObjectStream) -> Result<u64, S3Error> {
    let io_error = |source: std::io::Error| {
        S3Error::Transfer(TransferError::Io {
            path: path.display().to_string(),
            source,
        })
    };

    let file = tokio::fs::File::create(path).await.map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let mut reader = stream.into_async_read();
    let mut line = Vec::new();
    let mut written = 0u64;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).await.map_err(|e| {
            S3Error::Transfer(TransferError::StreamInterrupted {
                bytes_transferred: written,
                message: e.to_string(),
            })
        })?;
        if read == 0 {
            break;
        }
        writer.write_all(&line).await.map_err(io_error)?;
        written += read as u64;
    }

    writer.flush().await.map_err(io_error)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_headers_overrides_case_insensitively() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        headers.insert("x-amz-acl".to_string(), "public-read".to_string());

        let mut extra = HashMap::new();
        extra.insert("Content-Type".to_string(), "application/json".to_string());
        merge_headers(&mut headers, &extra);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Content-Type"], "application/json");
        assert!(!headers.contains_key("content-type"));
    }

    #[test]
    fn test_validate_location_rejects_dot_segments() {
        for key in [".", "..", "a/../../other_bucket/victim", "a/./b", "/../key"] {
            assert!(
                matches!(
                    validate_location("bucket", key),
                    Err(S3Error::Request(RequestError::InvalidObjectKey { .. }))
                ),
                "key {:?} should be rejected",
                key
            );
        }
        assert!(validate_location("bucket", "a..b/.hidden/c.").is_ok());
    }

    #[tokio::test]
    async fn test_save_lines_removes_partial_file_on_stream_error() {
        use futures::{stream, StreamExt};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.txt");
        let chunks: Vec<Result<Bytes, S3Error>> = vec![
            Ok(Bytes::from_static(b"first line\nsecond")),
            Err(S3Error::Transfer(TransferError::StreamInterrupted {
                bytes_transferred: 0,
                message: "connection reset".to_string(),
            })),
        ];
        let stream = ObjectStream::new(ObjectInfo::default(), stream::iter(chunks).boxed());

        let error = save_lines(&path, stream).await.unwrap_err();

        assert!(matches!(
            error,
            S3Error::Transfer(TransferError::StreamInterrupted { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_location() {
        assert!(validate_location("bucket", "key").is_ok());
        assert!(matches!(
            validate_location("", "key"),
            Err(S3Error::Request(RequestError::Validation { .. }))
        ));
        assert!(matches!(
            validate_location("bucket", ""),
            Err(S3Error::Request(RequestError::InvalidObjectKey { .. }))
        ));
    }

    #[test]
    fn test_error_from_response_falls_back_to_status() {
        let response = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::new(),
        };
        let error = error_from_response(&response, "bucket", "key");
        assert!(error.is_not_found());

        let response = HttpResponse {
            status: 502,
            headers: HashMap::new(),
            body: Bytes::from_static(b"<html>Bad Gateway</html>"),
        };
        let error = error_from_response(&response, "bucket", "key");
        assert_eq!(error.status_code(), Some(502));
    }

    #[test]
    fn test_error_from_response_fills_location() {
        let response = HttpResponse {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::from_static(
                b"<Error><Code>NoSuchKey</Code><Message>missing</Message></Error>",
            ),
        };
        match error_from_response(&response, "bucket", "key") {
            S3Error::Object(crate::error::ObjectError::NotFound { bucket, key, .. }) => {
                assert_eq!(bucket, "bucket");
                assert_eq!(key, "key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
