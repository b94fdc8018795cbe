//! Wire-agnostic record of a completed HTTP exchange.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::errors::{JamfError, Result};

/// A completed HTTP response, body fully buffered.
///
/// The transport hands this back for every call; decoding into typed models
/// is the caller's job via [`Response::json`] or [`Response::xml`], so the
/// transport never needs to know the wire format of an endpoint.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Canonical status text ("OK", "Not Found", ...).
    pub status: String,
    /// Response headers, names lowercased.
    pub headers: HashMap<String, String>,
    /// Raw response body.
    pub body: Bytes,
    /// Wall time from sending the request to the last body byte.
    pub duration: Duration,
    /// When the response was received.
    pub received_at: DateTime<Utc>,
}

impl Response {
    /// Construct an empty response, used by tests and error paths.
    #[must_use]
    pub fn empty(status_code: u16, status: &str) -> Self {
        Self {
            status_code,
            status: status.to_owned(),
            headers: HashMap::new(),
            body: Bytes::new(),
            duration: Duration::ZERO,
            received_at: Utc::now(),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Body length in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Body as text, lossily converted.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| JamfError::Decode(format!("invalid JSON body: {err}")))
    }

    /// Decode the body as XML into `T` (Classic API responses).
    pub fn xml<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let text = std::str::from_utf8(&self.body)
            .map_err(|err| JamfError::Decode(format!("XML body is not UTF-8: {err}")))?;
        quick_xml::de::from_str(text)
            .map_err(|err| JamfError::Decode(format!("invalid XML body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        id: String,
        name: String,
    }

    fn with_body(body: &str) -> Response {
        let mut resp = Response::empty(200, "OK");
        resp.body = Bytes::copy_from_slice(body.as_bytes());
        resp
    }

    #[test]
    fn decodes_json_body() {
        let resp = with_body(r#"{"id":"7","name":"Ops"}"#);
        let decoded: Named = resp.json().unwrap();
        assert_eq!(decoded, Named { id: "7".into(), name: "Ops".into() });
    }

    #[test]
    fn decodes_xml_body() {
        let resp = with_body("<Named><id>7</id><name>Ops</name></Named>");
        let decoded: Named = resp.xml().unwrap();
        assert_eq!(decoded, Named { id: "7".into(), name: "Ops".into() });
    }

    #[test]
    fn bad_json_is_a_decode_error() {
        let resp = with_body("not json");
        let result: Result<Named> = resp.json();
        assert!(matches!(result, Err(JamfError::Decode(_))));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut resp = Response::empty(200, "OK");
        resp.headers.insert("content-type".into(), "application/json".into());
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert_eq!(resp.header("x-missing"), None);
    }

    #[test]
    fn success_covers_2xx_only() {
        assert!(Response::empty(204, "No Content").is_success());
        assert!(!Response::empty(301, "Moved Permanently").is_success());
        assert!(!Response::empty(404, "Not Found").is_success());
    }
}
