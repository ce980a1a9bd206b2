//! Resource inventory endpoints

use reqwest::Method;

use super::ApiClient;
use super::types::{
    MessageResponse, Resource, ResourceCreate, ResourceMetrics, ResourceQuery, ResourceStats,
    ResourceUpdate,
};
use crate::Result;

/// `/resources/*` endpoints
#[derive(Debug, Clone, Copy)]
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ResourceApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List resources matching `query`
    pub async fn list(&self, query: &ResourceQuery) -> Result<Vec<Resource>> {
        let builder = self.client.request(Method::GET, "/resources").query(query);
        self.client.send_json(builder).await
    }

    /// Fetch one resource
    pub async fn get(&self, id: i64) -> Result<Resource> {
        let builder = self.client.request(Method::GET, &format!("/resources/{id}"));
        self.client.send_json(builder).await
    }

    /// Register a new resource
    pub async fn create(&self, data: &ResourceCreate) -> Result<Resource> {
        data.validate()?;
        let builder = self.client.request(Method::POST, "/resources").json(data);
        self.client.send_json(builder).await
    }

    /// Apply a partial update
    pub async fn update(&self, id: i64, data: &ResourceUpdate) -> Result<Resource> {
        let builder = self
            .client
            .request(Method::PUT, &format!("/resources/{id}"))
            .json(data);
        self.client.send_json(builder).await
    }

    /// Remove a resource
    pub async fn delete(&self, id: i64) -> Result<MessageResponse> {
        let builder = self
            .client
            .request(Method::DELETE, &format!("/resources/{id}"));
        self.client.send_json(builder).await
    }

    /// Push a usage sample
    pub async fn update_metrics(&self, id: i64, metrics: &ResourceMetrics) -> Result<MessageResponse> {
        metrics.validate()?;
        let builder = self
            .client
            .request(Method::POST, &format!("/resources/{id}/metrics"))
            .json(metrics);
        self.client.send_json(builder).await
    }

    /// Inventory summary
    pub async fn stats(&self) -> Result<ResourceStats> {
        let builder = self.client.request(Method::GET, "/resources/stats/summary");
        self.client.send_json(builder).await
    }
}
