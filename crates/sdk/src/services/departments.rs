//! Departments (Jamf Pro API).

use std::sync::Arc;

use jamfpro_client::{headers, HttpClient, Payload};
use jamfpro_domain::{Result, RsqlQuery};
use serde::{Deserialize, Serialize};

use super::{require_id, CreatedObject};

const URI: &str = "/api/v1/departments";

/// An organizational department devices and users can be scoped to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Server-assigned identifier; absent on create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name, unique per instance.
    pub name: String,
}

/// One page of departments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentList {
    /// Size of the whole collection.
    pub total_count: u64,
    /// This page's departments.
    pub results: Vec<Department>,
}

/// Operations on `/api/v1/departments`.
pub struct DepartmentsService {
    client: Arc<dyn HttpClient>,
}

impl DepartmentsService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// One page of departments.
    pub async fn list(&self, query: Option<&RsqlQuery>) -> Result<DepartmentList> {
        let response = self.client.get(URI, query, &headers::json()).await?;
        response.json()
    }

    /// A single department by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Department> {
        require_id(id)?;
        let response = self.client.get(&format!("{URI}/{id}"), None, &headers::json()).await?;
        response.json()
    }

    /// Create a department.
    pub async fn create(&self, department: &Department) -> Result<CreatedObject> {
        let body = Payload::json(department)?;
        let response = self.client.post(URI, body, &headers::json()).await?;
        response.json()
    }

    /// Replace a department by id.
    pub async fn update_by_id(&self, id: &str, department: &Department) -> Result<Department> {
        require_id(id)?;
        let body = Payload::json(department)?;
        let response = self.client.put(&format!("{URI}/{id}"), body, &headers::json()).await?;
        response.json()
    }

    /// Delete a department by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.client.delete(&format!("{URI}/{id}"), &headers::json()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::testing::client_for;

    #[tokio::test]
    async fn round_trips_a_department() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/departments/12"))
            .respond_with(ResponseTemplate::new(200)
                .set_body_json(json!({"id": "12", "name": "Engineering"})))
            .mount(&server)
            .await;

        let service = DepartmentsService::new(client_for(&server).await);
        let department = service.get_by_id("12").await.unwrap();
        assert_eq!(
            department,
            Department { id: Some("12".into()), name: "Engineering".into() }
        );
    }

    #[tokio::test]
    async fn update_puts_the_full_model() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/departments/12"))
            .and(body_json(json!({"name": "Platform"})))
            .respond_with(ResponseTemplate::new(200)
                .set_body_json(json!({"id": "12", "name": "Platform"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = DepartmentsService::new(client_for(&server).await);
        let updated = service
            .update_by_id("12", &Department { id: None, name: "Platform".into() })
            .await
            .unwrap();
        assert_eq!(updated.name, "Platform");
    }
}
