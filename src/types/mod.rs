//! Types used throughout the client.
//!
//! Request types are built per call; response types carry what the
//! executors extract from headers and bodies.

mod common;
mod requests;
mod responses;

pub use common::*;
pub use requests::*;
pub use responses::*;
