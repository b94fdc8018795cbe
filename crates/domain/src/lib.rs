//! Core types shared across the Jamf Pro SDK.
//!
//! This crate is intentionally free of I/O: it defines the error taxonomy,
//! the wire-agnostic [`Response`] record, and the RSQL query/filter builders
//! that higher layers compose into HTTP calls.

pub mod errors;
pub mod response;
pub mod rsql;

pub use errors::{ApiError, ErrorKind, JamfError, Result};
pub use response::Response;
pub use rsql::{RsqlFilter, RsqlQuery};
