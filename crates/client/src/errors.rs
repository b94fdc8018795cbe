//! Conversions from transport-layer errors into domain errors.

use jamfpro_domain::JamfError;
use reqwest::Error as HttpError;

/// Error newtype that keeps the reqwest conversion on the transport side and
/// can be converted back into the domain error.
#[derive(Debug)]
pub struct WireError(pub JamfError);

impl From<WireError> for JamfError {
    fn from(value: WireError) -> Self {
        value.0
    }
}

impl From<JamfError> for WireError {
    fn from(value: JamfError) -> Self {
        WireError(value)
    }
}

impl From<HttpError> for WireError {
    fn from(err: HttpError) -> Self {
        if err.is_timeout() {
            return WireError(JamfError::Network("HTTP request timed out".into()));
        }

        if err.is_connect() {
            return WireError(JamfError::Network(format!("HTTP connection failure: {err}")));
        }

        if err.is_body() || err.is_decode() {
            return WireError(JamfError::Network(format!("HTTP body transfer failed: {err}")));
        }

        if err.is_builder() || err.is_request() {
            return WireError(JamfError::Config(format!("Invalid HTTP request: {err}")));
        }

        // Status-bearing errors only occur via error_for_status(); the
        // executor inspects statuses itself, so this is a fallback.
        if let Some(status) = err.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return match code {
                401 | 403 => WireError(JamfError::Auth(message)),
                _ => WireError(JamfError::Network(message)),
            };
        }

        WireError(JamfError::Network(err.to_string()))
    }
}
