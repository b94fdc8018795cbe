//! Error types used throughout the SDK.

use thiserror::Error;

use crate::response::Response;

/// Main error type for the Jamf Pro SDK.
#[derive(Error, Debug)]
pub enum JamfError {
    /// Invalid or incomplete client configuration, detected before any
    /// network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition, refresh, or keep-alive failed, or the server kept
    /// rejecting credentials after a refresh.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The request never produced an HTTP response (DNS, connect, TLS,
    /// timeout, aborted body).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A response body could not be decoded into the requested type.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, JamfError>;

impl JamfError {
    /// Classification of the error when it originated from an HTTP status.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind),
            Self::Auth(_) => Some(ErrorKind::Auth),
            _ => None,
        }
    }

    /// True when the server reported 404 for the addressed resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ErrorKind::NotFound)
    }

    /// True when the server reported a 409 conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind() == Some(ErrorKind::Conflict)
    }

    /// True for credential or token failures (401/403, or local auth errors).
    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.kind() == Some(ErrorKind::Auth)
    }

    /// True when the server reported a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.kind() == Some(ErrorKind::Server)
    }
}

/// Broad classification of an HTTP error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 401 or 403
    Auth,
    /// 5xx
    Server,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Map an HTTP status code onto its error kind.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            409 => Self::Conflict,
            401 | 403 => Self::Auth,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

/// A non-success answer from the Jamf Pro API, with the vendor's error
/// envelope decoded where possible.
///
/// The full [`Response`] is embedded so callers can still inspect status,
/// headers, and the raw body after an operation fails.
#[derive(Error, Debug, Clone)]
#[error("API error {status_code} ({kind:?}) on {method} {path}: {message}")]
pub struct ApiError {
    /// HTTP status code of the failed response.
    pub status_code: u16,
    /// Classification derived from the status code.
    pub kind: ErrorKind,
    /// Vendor error code, when the body carried one.
    pub code: Option<String>,
    /// Human-readable message extracted from the body, or a status-derived
    /// default when the body was empty or unparseable.
    pub message: String,
    /// HTTP method of the failed request.
    pub method: String,
    /// Request path (without the instance domain).
    pub path: String,
    /// The complete failed response.
    pub response: Response,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_status_classes() {
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Unknown);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unknown);
    }

    #[test]
    fn helpers_follow_api_error_kind() {
        let err = JamfError::Api(ApiError {
            status_code: 404,
            kind: ErrorKind::NotFound,
            code: None,
            message: "Resource not found".into(),
            method: "GET".into(),
            path: "/api/v1/categories/9".into(),
            response: Response::empty(404, "Not Found"),
        });
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(!err.is_auth());
    }

    #[test]
    fn auth_variant_reports_auth_kind() {
        let err = JamfError::Auth("token rejected twice".into());
        assert!(err.is_auth());
        assert!(!err.is_server_error());
    }
}
