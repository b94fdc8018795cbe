//! Scripts (Jamf Pro API).

use std::sync::Arc;

use jamfpro_client::{headers, HttpClient, Payload};
use jamfpro_domain::{Result, RsqlQuery};
use serde::{Deserialize, Serialize};

use super::{require_id, CreatedObject};

const URI: &str = "/api/v1/scripts";

/// A shell script deployable through policies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Server-assigned identifier; absent on create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Owning category id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Free-form info shown in the console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Admin notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Execution priority (`BEFORE`, `AFTER`, `AT_REBOOT`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// The script body itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_contents: Option<String>,
}

/// One page of scripts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptList {
    /// Size of the whole collection.
    pub total_count: u64,
    /// This page's scripts.
    pub results: Vec<Script>,
}

/// Operations on `/api/v1/scripts`.
pub struct ScriptsService {
    client: Arc<dyn HttpClient>,
}

impl ScriptsService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// One page of scripts; combine with an RSQL filter to narrow results.
    pub async fn list(&self, query: Option<&RsqlQuery>) -> Result<ScriptList> {
        let response = self.client.get(URI, query, &headers::json()).await?;
        response.json()
    }

    /// A single script by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Script> {
        require_id(id)?;
        let response = self.client.get(&format!("{URI}/{id}"), None, &headers::json()).await?;
        response.json()
    }

    /// Create a script.
    pub async fn create(&self, script: &Script) -> Result<CreatedObject> {
        let body = Payload::json(script)?;
        let response = self.client.post(URI, body, &headers::json()).await?;
        response.json()
    }

    /// Replace a script by id.
    pub async fn update_by_id(&self, id: &str, script: &Script) -> Result<Script> {
        require_id(id)?;
        let body = Payload::json(script)?;
        let response = self.client.put(&format!("{URI}/{id}"), body, &headers::json()).await?;
        response.json()
    }

    /// Delete a script by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.client.delete(&format!("{URI}/{id}"), &headers::json()).await?;
        Ok(())
    }
}
