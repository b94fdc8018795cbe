//! Packages (Jamf Pro API), including the multipart binary upload.

use std::sync::Arc;

use jamfpro_client::{headers, HttpClient, MultipartUpload, Payload, ProgressCallback, UploadSource};
use jamfpro_domain::{Result, RsqlQuery};
use serde::{Deserialize, Serialize};

use super::{require_id, CreatedObject};

const URI: &str = "/api/v1/packages";

/// Metadata for a distributable package; the binary is uploaded separately
/// via [`PackagesService::upload`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Server-assigned identifier; absent on create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub package_name: String,
    /// File name of the uploaded binary.
    pub file_name: String,
    /// Owning category id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Free-form info shown in the console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Admin notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Whether installation requires a reboot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reboot_required: Option<bool>,
}

/// One page of packages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageList {
    /// Size of the whole collection.
    pub total_count: u64,
    /// This page's packages.
    pub results: Vec<Package>,
}

/// Operations on `/api/v1/packages`.
pub struct PackagesService {
    client: Arc<dyn HttpClient>,
}

impl PackagesService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// One page of packages.
    pub async fn list(&self, query: Option<&RsqlQuery>) -> Result<PackageList> {
        let response = self.client.get(URI, query, &headers::json()).await?;
        response.json()
    }

    /// A single package by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Package> {
        require_id(id)?;
        let response = self.client.get(&format!("{URI}/{id}"), None, &headers::json()).await?;
        response.json()
    }

    /// Create package metadata; the server assigns the id.
    pub async fn create(&self, package: &Package) -> Result<CreatedObject> {
        let body = Payload::json(package)?;
        let response = self.client.post(URI, body, &headers::json()).await?;
        response.json()
    }

    /// Replace package metadata by id.
    pub async fn update_by_id(&self, id: &str, package: &Package) -> Result<Package> {
        require_id(id)?;
        let body = Payload::json(package)?;
        let response = self.client.put(&format!("{URI}/{id}"), body, &headers::json()).await?;
        response.json()
    }

    /// Delete a package by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.client.delete(&format!("{URI}/{id}"), &headers::json()).await?;
        Ok(())
    }

    /// Upload the package binary, streaming it as multipart form data.
    ///
    /// `progress`, when given, receives `(bytes_sent, total_bytes)` per
    /// chunk.
    pub async fn upload(
        &self,
        id: &str,
        file_name: &str,
        source: UploadSource,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        require_id(id)?;
        let mut upload = MultipartUpload::new("file", file_name, source);
        if let Some(progress) = progress {
            upload = upload.with_progress(progress);
        }
        self.client
            .post_multipart(&format!("{URI}/{id}/upload"), upload, &jamfpro_client::Headers::new())
            .await?;
        Ok(())
    }
}
