//! Categories (Jamf Pro API).

use std::sync::Arc;

use jamfpro_client::{headers, HttpClient, Payload};
use jamfpro_domain::{JamfError, Result, RsqlQuery};
use serde::{Deserialize, Serialize};

use super::{require_id, CreatedObject};

const URI: &str = "/api/v1/categories";

/// A category used to group policies, packages, and scripts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Server-assigned identifier; absent on create requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name, unique per instance.
    pub name: String,
    /// Sort priority (1-20).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// One page of categories.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryList {
    /// Size of the whole collection, not just this page.
    pub total_count: u64,
    /// This page's categories.
    pub results: Vec<Category>,
}

#[derive(Serialize)]
struct DeleteMultipleRequest<'a> {
    ids: &'a [String],
}

/// Operations on `/api/v1/categories`.
pub struct CategoriesService {
    client: Arc<dyn HttpClient>,
}

impl CategoriesService {
    pub(crate) fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// One page of categories, honoring any RSQL filter/sort/page settings.
    pub async fn list(&self, query: Option<&RsqlQuery>) -> Result<CategoryList> {
        let response = self.client.get(URI, query, &headers::json()).await?;
        response.json()
    }

    /// Every category in the collection, walking all pages.
    pub async fn list_all(&self, query: Option<&RsqlQuery>) -> Result<Vec<Category>> {
        let mut all = Vec::new();
        self.client
            .get_paginated(URI, query, &headers::json(), &mut |results| {
                for raw in results {
                    let item: Category = serde_json::from_str(raw.get()).map_err(|err| {
                        JamfError::Decode(format!("invalid category element: {err}"))
                    })?;
                    all.push(item);
                }
                Ok(())
            })
            .await?;
        Ok(all)
    }

    /// A single category by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Category> {
        require_id(id)?;
        let response = self.client.get(&format!("{URI}/{id}"), None, &headers::json()).await?;
        response.json()
    }

    /// Create a category; the server assigns the id.
    pub async fn create(&self, category: &Category) -> Result<CreatedObject> {
        let body = Payload::json(category)?;
        let response = self.client.post(URI, body, &headers::json()).await?;
        response.json()
    }

    /// Replace a category by id.
    pub async fn update_by_id(&self, id: &str, category: &Category) -> Result<Category> {
        require_id(id)?;
        let body = Payload::json(category)?;
        let response = self.client.put(&format!("{URI}/{id}"), body, &headers::json()).await?;
        response.json()
    }

    /// Delete a category by id.
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        require_id(id)?;
        self.client.delete(&format!("{URI}/{id}"), &headers::json()).await?;
        Ok(())
    }

    /// Delete several categories in one call.
    pub async fn delete_multiple(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Err(JamfError::Config("at least one id is required".into()));
        }
        let body = Payload::json(&DeleteMultipleRequest { ids })?;
        self.client.post(&format!("{URI}/delete-multiple"), body, &headers::json()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::testing::client_for;

    #[tokio::test]
    async fn list_decodes_the_page_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .and(query_param("filter", r#"name=="Utilities""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalCount": 1,
                "results": [{"id": "3", "name": "Utilities", "priority": 5}],
            })))
            .mount(&server)
            .await;

        let service = CategoriesService::new(client_for(&server).await);
        let query = RsqlQuery::new().filter(r#"name=="Utilities""#);
        let page = service.list(Some(&query)).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.results[0].name, "Utilities");
        assert_eq!(page.results[0].priority, Some(5));
    }

    #[tokio::test]
    async fn list_all_accumulates_every_page() {
        let server = MockServer::start().await;
        let page = |ids: std::ops::Range<u32>, total: u64| {
            ResponseTemplate::new(200).set_body_json(json!({
                "totalCount": total,
                "results": ids
                    .map(|id| json!({"id": id.to_string(), "name": format!("cat-{id}")}))
                    .collect::<Vec<_>>(),
            }))
        };
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .and(query_param("page", "0"))
            .respond_with(page(0..2, 3))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .and(query_param("page", "1"))
            .respond_with(page(2..3, 3))
            .mount(&server)
            .await;

        let service = CategoriesService::new(client_for(&server).await);
        let query = RsqlQuery::new().page_size(2);
        let all = service.list_all(Some(&query)).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].name, "cat-2");
    }

    #[tokio::test]
    async fn create_posts_the_model_and_returns_the_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/categories"))
            .and(body_json(json!({"name": "Utilities", "priority": 3})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "10",
                "href": "/api/v1/categories/10",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = CategoriesService::new(client_for(&server).await);
        let created = service
            .create(&Category { id: None, name: "Utilities".into(), priority: Some(3) })
            .await
            .unwrap();
        assert_eq!(created, CreatedObject { id: "10".into(), href: "/api/v1/categories/10".into() });
    }

    #[tokio::test]
    async fn delete_multiple_sends_the_id_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/categories/delete-multiple"))
            .and(body_json(json!({"ids": ["1", "2"]})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let service = CategoriesService::new(client_for(&server).await);
        service.delete_multiple(&["1".into(), "2".into()]).await.unwrap();
    }

    #[tokio::test]
    async fn blank_ids_never_reach_the_wire() {
        let server = MockServer::start().await;
        let service = CategoriesService::new(client_for(&server).await);
        assert!(matches!(service.get_by_id("  ").await, Err(JamfError::Config(_))));
        assert!(matches!(service.delete_by_id("").await, Err(JamfError::Config(_))));
        assert!(matches!(service.delete_multiple(&[]).await, Err(JamfError::Config(_))));
    }

    #[tokio::test]
    async fn missing_category_surfaces_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "RESOURCE_NOT_FOUND",
                "message": "Category not found",
            })))
            .mount(&server)
            .await;

        let service = CategoriesService::new(client_for(&server).await);
        let err = service.get_by_id("99").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
