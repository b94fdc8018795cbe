//! Self Service icons: binary upload and download.

use std::sync::Arc;

use bytes::Bytes;
use jamfpro_client::{Headers, HttpClient, MultipartUpload, UploadSource};
use jamfpro_domain::Result;
use serde::Deserialize;

use super::require_id;

const URI: &str = "/api/v1/icon";

/// Upload acknowledgment for an icon.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Icon {
    /// Server-assigned icon id.
    pub id: u64,
    /// Public URL of the stored icon.
    pub url: String,
}

/// Operations on `/api/v1/icon`.
pub struct IconsService {
    client: Arc<dyn HttpClient>,
}

impl IconsService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Upload an icon image.
    pub async fn upload(&self, file_name: &str, source: UploadSource) -> Result<Icon> {
        let upload = MultipartUpload::new("file", file_name, source);
        let response = self.client.post_multipart(URI, upload, &Headers::new()).await?;
        response.json()
    }

    /// Download the raw icon bytes.
    pub async fn download(&self, id: &str) -> Result<Bytes> {
        require_id(id)?;
        let response =
            self.client.get_bytes(&format!("{URI}/download/{id}"), None, &Headers::new()).await?;
        Ok(response.body)
    }
}
