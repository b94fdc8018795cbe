//! # Jamf Pro SDK transport core
//!
//! Everything between an API service and the wire lives here:
//! - [`config`]: instance/credential resolution (env or file)
//! - [`auth`]: bearer-token lifecycle with single-flight refresh
//! - [`transport`]: the request executor, pagination driver, and streamed
//!   multipart uploads
//! - [`ports`]: the [`HttpClient`] capability trait services depend on
//!
//! Retry policy in one sentence: a 401 triggers one token refresh and one
//! resend, and nothing else is ever retried.

pub mod auth;
pub mod config;
pub mod errors;
pub mod ports;
pub mod transport;

mod translate;

pub use auth::BearerToken;
pub use config::{AuthConfig, AuthMethod};
pub use ports::{
    headers, Headers, HttpClient, MergePage, MultipartUpload, Payload, ProgressCallback,
    UploadSource,
};
pub use transport::{Transport, TransportBuilder};
