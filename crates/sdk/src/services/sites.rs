//! Sites (Classic API, XML).
//!
//! The Classic API lives under `/JSSResource` and speaks XML; models here
//! serialize with quick-xml and requests go out with XML headers. Create
//! always POSTs to `/id/0`, and the server picks the real id.

use std::sync::Arc;

use jamfpro_client::{headers, HttpClient};
use jamfpro_domain::{JamfError, Result};
use serde::{Deserialize, Serialize};

use super::{require_id, xml_body};

const URI: &str = "/JSSResource/sites";

/// A physical or organizational site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename = "site")]
pub struct Site {
    /// Server-assigned identifier; absent on create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    /// Display name, unique per instance.
    pub name: String,
}

/// `<sites>` collection envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "sites")]
pub struct SiteList {
    /// Collection size as reported by the server.
    #[serde(default)]
    pub size: Option<u32>,
    /// The sites themselves.
    #[serde(default)]
    pub site: Vec<Site>,
}

/// `<site><id>N</id></site>` acknowledgment from create/update.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename = "site")]
pub struct SiteId {
    /// Identifier of the affected site.
    pub id: i32,
}

/// Operations on `/JSSResource/sites`.
pub struct SitesService {
    client: Arc<dyn HttpClient>,
}

impl SitesService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// All sites (the Classic API does not paginate).
    pub async fn list(&self) -> Result<SiteList> {
        let response = self.client.get(URI, None, &headers::xml()).await?;
        response.xml()
    }

    /// A single site by numeric id.
    pub async fn get_by_id(&self, id: i32) -> Result<Site> {
        let response =
            self.client.get(&format!("{URI}/id/{id}"), None, &headers::xml()).await?;
        response.xml()
    }

    /// A single site by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Site> {
        require_name(name)?;
        let response =
            self.client.get(&format!("{URI}/name/{name}"), None, &headers::xml()).await?;
        response.xml()
    }

    /// Create a site; the server assigns the id.
    pub async fn create(&self, site: &Site) -> Result<SiteId> {
        let body = xml_body(site)?;
        let response = self.client.post(&format!("{URI}/id/0"), body, &headers::xml()).await?;
        response.xml()
    }

    /// Replace a site by id.
    pub async fn update_by_id(&self, id: i32, site: &Site) -> Result<SiteId> {
        let body = xml_body(site)?;
        let response = self.client.put(&format!("{URI}/id/{id}"), body, &headers::xml()).await?;
        response.xml()
    }

    /// Delete a site by id.
    pub async fn delete_by_id(&self, id: i32) -> Result<()> {
        self.client.delete(&format!("{URI}/id/{id}"), &headers::xml()).await?;
        Ok(())
    }

    /// Delete a site by name.
    pub async fn delete_by_name(&self, name: &str) -> Result<()> {
        require_name(name)?;
        self.client.delete(&format!("{URI}/name/{name}"), &headers::xml()).await?;
        Ok(())
    }
}

fn require_name(name: &str) -> Result<()> {
    require_id(name).map_err(|_| JamfError::Config("site name must not be empty".into()))
}
