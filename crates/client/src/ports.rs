//! The transport capability surface consumed by API services.
//!
//! Services depend on [`HttpClient`] as a trait object so they stay
//! stateless and mockable; [`crate::transport::Transport`] is the production
//! implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use jamfpro_domain::{JamfError, Response, Result, RsqlFilter, RsqlQuery};
use serde_json::value::RawValue;

pub use crate::transport::multipart::UploadSource;

/// Request headers as a plain map; names are sent as given.
pub type Headers = HashMap<String, String>;

/// Callback receiving `(bytes_sent, total_bytes)` per uploaded chunk.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Page-merge callback for [`HttpClient::get_paginated`]: receives the raw
/// `results` array of each page, in order.
pub type MergePage<'a> = &'a mut (dyn FnMut(Vec<Box<RawValue>>) -> Result<()> + Send);

/// Common header sets for the two API families.
pub mod headers {
    use super::Headers;

    /// `Accept`/`Content-Type: application/json` (Jamf Pro API).
    #[must_use]
    pub fn json() -> Headers {
        Headers::from([
            ("Accept".to_owned(), "application/json".to_owned()),
            ("Content-Type".to_owned(), "application/json".to_owned()),
        ])
    }

    /// `Accept`/`Content-Type: application/xml` (Classic API).
    #[must_use]
    pub fn xml() -> Headers {
        Headers::from([
            ("Accept".to_owned(), "application/xml".to_owned()),
            ("Content-Type".to_owned(), "application/xml".to_owned()),
        ])
    }
}

/// Request body, serialized by the caller's chosen wire format.
///
/// The executor only transports these; it never picks a format itself.
#[derive(Debug, Clone)]
pub enum Payload {
    /// No body.
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Pre-serialized XML document (Classic API).
    Xml(String),
    /// Arbitrary bytes with an explicit content type.
    Raw {
        /// Value for the `Content-Type` header.
        content_type: String,
        /// Body bytes.
        data: Bytes,
    },
}

impl Payload {
    /// Encode a serde value as a JSON payload.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|err| JamfError::Decode(format!("failed to encode JSON body: {err}")))?;
        Ok(Self::Json(value))
    }
}

/// A multipart file upload request.
pub struct MultipartUpload {
    /// Form field name carrying the file part.
    pub field_name: String,
    /// File name reported to the server.
    pub file_name: String,
    /// Where the bytes come from.
    pub source: UploadSource,
    /// Additional plain form fields.
    pub fields: Vec<(String, String)>,
    /// Optional per-chunk progress callback.
    pub progress: Option<ProgressCallback>,
}

impl MultipartUpload {
    /// Upload `source` as form field `field_name` with the given file name.
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        source: UploadSource,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            source,
            fields: Vec::new(),
            progress: None,
        }
    }

    /// Add a plain form field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Capability interface over the shared HTTP transport.
///
/// Every method resolves against the configured instance domain, attaches a
/// valid bearer token, retries exactly once after a 401 (behind a token
/// refresh), and translates error statuses into [`JamfError::Api`]. Body
/// decoding is left to the caller via [`Response::json`] / [`Response::xml`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a resource.
    async fn get(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
    ) -> Result<Response>;

    /// GET a binary resource (no decoding expectations; body stays raw).
    async fn get_bytes(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
    ) -> Result<Response>;

    /// POST with an optional body.
    async fn post(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response>;

    /// POST with query parameters and an optional body.
    async fn post_with_query(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        body: Payload,
        headers: &Headers,
    ) -> Result<Response>;

    /// POST an urlencoded form.
    async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        headers: &Headers,
    ) -> Result<Response>;

    /// POST a streamed multipart upload.
    async fn post_multipart(
        &self,
        path: &str,
        upload: MultipartUpload,
        headers: &Headers,
    ) -> Result<Response>;

    /// PUT a full replacement.
    async fn put(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response>;

    /// PATCH a partial update.
    async fn patch(&self, path: &str, body: Payload, headers: &Headers) -> Result<Response>;

    /// DELETE a resource.
    async fn delete(&self, path: &str, headers: &Headers) -> Result<Response>;

    /// DELETE with a request body (bulk deletes).
    async fn delete_with_body(
        &self,
        path: &str,
        body: Payload,
        headers: &Headers,
    ) -> Result<Response>;

    /// Walk a `{totalCount, results}` paginated collection, feeding each raw
    /// page to `merge_page`. Returns the final page's response.
    async fn get_paginated(
        &self,
        path: &str,
        query: Option<&RsqlQuery>,
        headers: &Headers,
        merge_page: MergePage<'_>,
    ) -> Result<Response>;

    /// Revoke the current token server-side and drop it locally. Succeeds
    /// without a network call when no token is held.
    async fn invalidate_token(&self) -> Result<()>;

    /// Extend the current token's lifetime via the keep-alive endpoint.
    async fn keep_alive_token(&self) -> Result<()>;

    /// Fresh RSQL filter builder.
    fn rsql_builder(&self) -> RsqlFilter {
        RsqlFilter::new()
    }

    /// The transport's root tracing span.
    fn logger(&self) -> tracing::Span;
}
