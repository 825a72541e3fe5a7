//! S3 service implementations.
//!
//! - Objects: get, delete, copy, update metadata, upload, head and list

mod objects;

pub use objects::ObjectsService;
