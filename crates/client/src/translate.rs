//! Translation of non-success responses into [`ApiError`].
//!
//! The Jamf Pro API answers errors in two dialects: the modern API uses a
//! JSON envelope (either `{code, message}` or `{httpStatus, errors: [...]}`),
//! while the Classic API returns an HTML fragment with `<br>`-separated
//! lines. Anything unparseable degrades to the raw body or a status-derived
//! default; translation never fails.

use jamfpro_domain::{ApiError, ErrorKind, Response};
use serde::Deserialize;

/// Modern-API error envelope, both shapes.
#[derive(Debug, Deserialize)]
struct VendorEnvelope {
    code: Option<String>,
    message: Option<String>,
    errors: Option<Vec<VendorDetail>>,
}

#[derive(Debug, Deserialize)]
struct VendorDetail {
    code: Option<String>,
    description: Option<String>,
}

/// Build an [`ApiError`] from a non-success response.
pub(crate) fn translate(method: &str, path: &str, response: Response) -> ApiError {
    let kind = ErrorKind::from_status(response.status_code);
    let (code, message) = extract(&response);
    ApiError {
        status_code: response.status_code,
        kind,
        code,
        message,
        method: method.to_owned(),
        path: path.to_owned(),
        response,
    }
}

fn extract(response: &Response) -> (Option<String>, String) {
    let text = response.text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (None, default_message(response.status_code));
    }

    if trimmed.starts_with('{') {
        if let Ok(envelope) = serde_json::from_str::<VendorEnvelope>(trimmed) {
            if let Some(message) = envelope.message.filter(|m| !m.is_empty()) {
                return (envelope.code, message);
            }
            if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
                let code = errors.first().and_then(|e| e.code.clone());
                let message = errors
                    .iter()
                    .filter_map(|e| e.description.as_deref())
                    .collect::<Vec<_>>()
                    .join("; ");
                if !message.is_empty() {
                    return (code, message);
                }
            }
        }
        return (None, trimmed.to_owned());
    }

    if trimmed.starts_with('<') {
        if let Some(message) = last_markup_segment(trimmed) {
            return (None, message);
        }
    }

    (None, trimmed.to_owned())
}

/// Strip tags from an HTML/XML fragment and return the last non-empty text
/// segment, which carries the actual error in Classic API responses like
/// `<br>An error has occurred.<br>Resource not found<br><br>`.
fn last_markup_segment(fragment: &str) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_tag = false;

    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    segments.push(unescape(trimmed));
                }
                current.clear();
            }
            '>' => in_tag = false,
            _ if !in_tag => current.push(ch),
            _ => {}
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(unescape(trimmed));
    }

    segments.pop()
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn default_message(status: u16) -> String {
    let reason = match status {
        400 => "bad request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "resource not found",
        409 => "conflict with the current state of the resource",
        500 => "internal server error",
        502 => "bad gateway",
        503 => "service unavailable",
        _ => "request failed",
    };
    format!("HTTP {status}: {reason}")
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn response_with(status: u16, body: &str) -> Response {
        let mut response = Response::empty(status, "");
        response.body = Bytes::copy_from_slice(body.as_bytes());
        response
    }

    #[test]
    fn parses_json_code_message_envelope() {
        let response =
            response_with(404, r#"{"code":"RESOURCE_NOT_FOUND","message":"No such category"}"#);
        let err = translate("GET", "/api/v1/categories/9", response);
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.code.as_deref(), Some("RESOURCE_NOT_FOUND"));
        assert_eq!(err.message, "No such category");
        assert_eq!(err.status_code, 404);
    }

    #[test]
    fn parses_json_errors_array_envelope() {
        let body = r#"{"httpStatus":409,"errors":[
            {"code":"DUPLICATE_FIELD","description":"Name already in use","field":"name"},
            {"code":"INVALID_FIELD","description":"Priority out of range","field":"priority"}
        ]}"#;
        let err = translate("POST", "/api/v1/categories", response_with(409, body));
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.code.as_deref(), Some("DUPLICATE_FIELD"));
        assert_eq!(err.message, "Name already in use; Priority out of range");
    }

    #[test]
    fn strips_classic_html_fragment() {
        let body = "<br>An error has occurred.<br>Resource not found<br><br>";
        let err = translate("GET", "/JSSResource/sites/id/99", response_with(404, body));
        assert_eq!(err.message, "Resource not found");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn unescapes_entities_in_markup() {
        let body = "<br>Conflict: name &quot;Lab &amp; Office&quot; exists<br>";
        let err = translate("POST", "/JSSResource/sites/id/0", response_with(409, body));
        assert_eq!(err.message, "Conflict: name \"Lab & Office\" exists");
    }

    #[test]
    fn empty_body_uses_status_default() {
        let err = translate("DELETE", "/api/v1/categories/1", response_with(500, ""));
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, "HTTP 500: internal server error");
    }

    #[test]
    fn unparseable_json_falls_back_to_raw_body() {
        let err = translate("GET", "/api/v1/x", response_with(418, r#"{"weird": true}"#));
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, r#"{"weird": true}"#);
    }

    #[test]
    fn auth_statuses_map_to_auth_kind() {
        let err = translate("GET", "/api/v1/x", response_with(403, ""));
        assert_eq!(err.kind, ErrorKind::Auth);
    }
}
