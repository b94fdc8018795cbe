//! API services: stateless, typed adapters over the shared transport.
//!
//! Each service holds only an `Arc<dyn HttpClient>`, performs exactly one
//! transport call per operation, and leaves retries, auth, and concurrency
//! to the transport. Modern ("Jamf Pro API") services speak JSON under
//! `/api/...`; Classic services speak XML under `/JSSResource/...`.

pub mod categories;
pub mod departments;
pub mod icons;
pub mod packages;
pub mod scripts;
pub mod sites;

use jamfpro_client::Payload;
use jamfpro_domain::{JamfError, Result};
use serde::Deserialize;

/// Creation acknowledgment from the modern API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CreatedObject {
    /// Server-assigned identifier.
    pub id: String,
    /// Canonical location of the new resource.
    pub href: String,
}

/// Reject blank identifiers before any network call.
pub(crate) fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(JamfError::Config("resource id must not be empty".into()));
    }
    Ok(())
}

/// Serialize a Classic API model into an XML payload.
pub(crate) fn xml_body<T: serde::Serialize>(value: &T) -> Result<Payload> {
    let document = quick_xml::se::to_string(value)
        .map_err(|err| JamfError::Decode(format!("failed to encode XML body: {err}")))?;
    Ok(Payload::Xml(document))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use jamfpro_client::{AuthConfig, HttpClient, Transport};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A client wired to `server`, with the token endpoint already mocked.
    pub(crate) async fn client_for(server: &MockServer) -> Arc<dyn HttpClient> {
        Mock::given(method("POST"))
            .and(path("/api/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test-token",
                "expires_in": 3600,
            })))
            .mount(server)
            .await;

        let transport = Transport::builder(AuthConfig::oauth2(server.uri(), "cid", "secret"))
            .build()
            .expect("transport builds");
        Arc::new(transport)
    }
}
