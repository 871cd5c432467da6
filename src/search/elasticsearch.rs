//! Elasticsearch REST client and search repository

use super::{Document, SearchRepository};
use crate::config::ElasticsearchConfig;
use crate::domain::{Page, PageRequest};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::marker::PhantomData;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    hits: Hits<T>,
}

#[derive(Debug, Deserialize)]
struct Hits<T> {
    hits: Vec<Hit<T>>,
}

#[derive(Debug, Deserialize)]
struct Hit<T> {
    #[serde(rename = "_source")]
    source: T,
}

/// Elasticsearch REST client
#[derive(Clone)]
pub struct ElasticsearchClient {
    config: ElasticsearchConfig,
    http_client: Client,
}

impl ElasticsearchClient {
    pub fn new(config: ElasticsearchConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.url, path.trim_start_matches('/'));
        let builder = self.http_client.request(method, url);
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn error_from(operation: &str, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AppError::Search(format!("Failed to {}: {} - {}", operation, status, body))
    }

    /// Cluster health probe
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .request(Method::GET, "/_cluster/health")
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach cluster: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from("check cluster health", response).await);
        }
        Ok(())
    }

    /// Create the index when it does not exist yet
    pub async fn ensure_index(&self, index: &str) -> Result<()> {
        let response = self
            .request(Method::HEAD, index)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to check index {}: {}", index, e)))?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(Self::error_from("check index", response).await);
        }

        let response = self
            .request(Method::PUT, index)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to create index {}: {}", index, e)))?;

        // Another instance may have created it in between
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            return Err(AppError::Search(format!(
                "Failed to create index {}: {}",
                index, body
            )));
        }
        if !response.status().is_success() {
            return Err(Self::error_from("create index", response).await);
        }

        tracing::info!("Created search index '{}'", index);
        Ok(())
    }

    /// Upsert a document under the given id
    pub async fn index_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: i64,
        document: &T,
    ) -> Result<()> {
        let response = self
            .request(Method::PUT, &format!("{}/_doc/{}", index, id))
            .json(document)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to index document: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from("index document", response).await);
        }
        Ok(())
    }

    /// Delete a document; 404 means it is already gone
    pub async fn delete_document(&self, index: &str, id: i64) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("{}/_doc/{}", index, id))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to delete document: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::error_from("delete document", response).await);
        }
        Ok(())
    }

    /// Run a `query_string` query and return the page of sources
    pub async fn search<T: DeserializeOwned>(
        &self,
        index: &str,
        query: &str,
        page: &PageRequest,
    ) -> Result<Vec<T>> {
        let mut body = json!({
            "query": { "query_string": { "query": query } },
            "from": page.offset(),
            "size": page.per_page,
        });
        if let Some(sort) = &page.sort {
            let mut order = serde_json::Map::new();
            order.insert(
                sort.field.clone(),
                json!({ "order": sort.direction.as_str() }),
            );
            body["sort"] = json!([order]);
        }

        let response = self
            .request(Method::POST, &format!("{}/_search", index))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to search: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::error_from("search", response).await);
        }

        let parsed: SearchResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}

/// Search repository for one document type, backed by its own index
pub struct ElasticsearchSearchRepository<T> {
    client: ElasticsearchClient,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> ElasticsearchSearchRepository<T> {
    pub fn new(client: ElasticsearchClient) -> Self {
        Self {
            client,
            _document: PhantomData,
        }
    }

    fn record(operation: &'static str, result: &Result<()>) {
        let outcome = if result.is_ok() { "success" } else { "failure" };
        counter!(
            "credhub_index_operations_total",
            "entity" => T::ENTITY_NAME,
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
    }
}

#[async_trait]
impl<T: Document> SearchRepository<T> for ElasticsearchSearchRepository<T> {
    async fn save(&self, entity: &T) -> Result<()> {
        let id = entity.document_id().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Cannot index an unsaved {}",
                T::ENTITY_NAME
            ))
        })?;

        let result = self.client.index_document(T::INDEX_NAME, id, entity).await;
        Self::record("save", &result);
        result
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let result = self.client.delete_document(T::INDEX_NAME, id).await;
        Self::record("delete", &result);
        result
    }

    async fn search(&self, query: &str, page: &PageRequest) -> Result<Page<T>> {
        let mut index_page = page.clone();
        if let Some(sort) = index_page.sort.as_mut() {
            if T::KEYWORD_FIELDS.contains(&sort.field.as_str()) {
                sort.field = format!("{}.keyword", sort.field);
            }
        }
        let content: Vec<T> = self.client.search(T::INDEX_NAME, query, &index_page).await?;
        let total = content.len() as i64;
        Ok(Page::new(content, page, total))
    }
}
