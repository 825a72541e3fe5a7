//! XML parsing for S3 response bodies.

use crate::error::{ResponseError, S3Error, S3ErrorResponse};
use crate::types::{ListObjectsOutput, S3Object};
use quick_xml::events::Event;
use quick_xml::Reader;

fn xml_error(e: impl std::fmt::Display) -> S3Error {
    S3Error::Response(ResponseError::XmlParseError {
        message: e.to_string(),
    })
}

/// Walk `xml` and call `on_text` with the element path and text of every
/// text node. Returns the name of the root element.
fn walk_text<F>(xml: &str, mut on_text: F) -> Result<Option<String>, S3Error>
where
    F: FnMut(&[String], String),
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(name.clone());
                }
                path.push(name);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                on_text(&path, text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(root)
}

/// Parse an S3 `<Error>` document.
pub fn parse_error_response(xml: &str) -> Result<S3ErrorResponse, S3Error> {
    let mut response = S3ErrorResponse::default();

    let root = walk_text(xml, |path, text| {
        match path.last().map(String::as_str) {
            Some("Code") => response.code = text,
            Some("Message") => response.message = text,
            Some("BucketName") | Some("Bucket") => response.bucket = Some(text),
            Some("Key") => response.key = Some(text),
            Some("RequestId") => response.request_id = Some(text),
            Some("HostId") => response.host_id = Some(text),
            _ => {}
        }
    })?;

    if root.as_deref() != Some("Error") || response.code.is_empty() {
        return Err(xml_error("document is not an S3 error"));
    }

    Ok(response)
}

/// ETag and timestamp from a `<CopyObjectResult>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyObjectResult {
    /// ETag of the new object.
    pub e_tag: Option<String>,
    /// Last modified.
    pub last_modified: Option<String>,
}

/// Parse the body of a successful copy.
///
/// S3 may answer a copy with status 200 and an `<Error>` body when the copy
/// fails after it started; that case is returned as `Err` with the parsed
/// error so the caller can map it.
pub fn parse_copy_object_result(xml: &str) -> Result<Result<CopyObjectResult, S3ErrorResponse>, S3Error> {
    if xml.trim().is_empty() {
        return Ok(Ok(CopyObjectResult::default()));
    }

    let mut result = CopyObjectResult::default();
    let root = walk_text(xml, |path, text| match path.last().map(String::as_str) {
        Some("ETag") => result.e_tag = Some(text),
        Some("LastModified") => result.last_modified = Some(text),
        _ => {}
    })?;

    if root.as_deref() == Some("Error") {
        return parse_error_response(xml).map(Err);
    }

    Ok(Ok(result))
}

/// Parse a ListObjectsV2 response.
pub fn parse_list_objects_v2(xml: &str) -> Result<ListObjectsOutput, S3Error> {
    let mut output = ListObjectsOutput::default();
    let mut current: Option<S3Object> = None;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "Contents" {
                    current = Some(S3Object::default());
                }
                path.push(name);
            }
            Event::End(e) => {
                if e.name().as_ref() == b"Contents" {
                    if let Some(object) = current.take() {
                        output.contents.push(object);
                    }
                }
                path.pop();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                let element = path.last().map(String::as_str).unwrap_or_default();

                if let Some(object) = current.as_mut() {
                    match element {
                        "Key" => object.key = text,
                        "LastModified" => object.last_modified = Some(text),
                        "ETag" => object.e_tag = Some(text),
                        "Size" => object.size = text.parse().unwrap_or_default(),
                        "StorageClass" => object.storage_class = Some(text),
                        _ => {}
                    }
                } else if path.len() == 2 {
                    match element {
                        "Name" => output.name = Some(text),
                        "Prefix" => output.prefix = Some(text),
                        "KeyCount" => output.key_count = text.parse().ok(),
                        "MaxKeys" => output.max_keys = text.parse().ok(),
                        "IsTruncated" => output.is_truncated = text == "true",
                        "ContinuationToken" => output.continuation_token = Some(text),
                        "NextContinuationToken" => output.next_continuation_token = Some(text),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(output)
}
