//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::bulk::{parse_bulk_response, BulkRequest};
use crate::types::{BatchOperationSummary, BulkDocument};

/// OpenSearch client implementation.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new("http://localhost:9200").await?;
/// client.create_index("movies", &movies_index_settings()).await?;
/// let summary = client.bulk_index("movies", &documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Turn a non-success response into an error, reading its body for context.
    async fn status_error(response: Response, otherwise: fn(String) -> SearchError) -> SearchError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::failure(status, body, otherwise)
    }

    fn failure(status: u16, body: String, otherwise: fn(String) -> SearchError) -> SearchError {
        error!(status = status, body = %body, "Search engine request failed");
        SearchError::from_status(status, body, otherwise)
    }
}

/// Whether a failed create-index response says the index is already there.
fn already_exists(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .map(|parsed| parsed["error"]["type"] == "resource_already_exists_exception")
        .unwrap_or(false)
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let request = BulkRequest::new(index, documents);

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(request.into_body())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::status_error(response, SearchError::BulkIndexError).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let summary = parse_bulk_response(&body, documents)?;
        debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(Self::status_error(response, SearchError::ParseError).await),
        }
    }

    #[instrument(skip(self, schema))]
    async fn create_index(&self, index: &str, schema: &Value) -> Result<bool, SearchError> {
        if self.index_exists(index).await? {
            debug!(index = %index, "Index already exists");
            return Ok(false);
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(schema.clone())
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index, "Index created");
            return Ok(true);
        }

        // Another writer may have created it between the check and the PUT.
        let body = response.text().await.unwrap_or_default();
        if already_exists(&body) {
            debug!(index = %index, "Index created concurrently");
            return Ok(false);
        }

        Err(Self::failure(status.as_u16(), body, SearchError::IndexCreationError))
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            404 => {
                info!(index = %index, "Index does not exist");
                Ok(false)
            }
            status if (200..300).contains(&status) => {
                info!(index = %index, "Index deleted");
                Ok(true)
            }
            _ => Err(Self::status_error(response, SearchError::IndexDeletionError).await),
        }
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(matches!(body["status"].as_str(), Some("green") | Some("yellow")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Transient;

    #[test]
    fn test_concurrent_creation_is_recognized() {
        let body = r#"{"error":{"type":"resource_already_exists_exception","reason":"index [movies/abc] already exists"},"status":400}"#;
        assert!(already_exists(body));
        assert!(!already_exists(r#"{"error":{"type":"mapper_parsing_exception"},"status":400}"#));
    }

    #[test]
    fn test_non_json_failure_body_is_kept() {
        let body = "<html><body>502 Bad Gateway</body></html>";
        assert!(!already_exists(body));

        let err = OpenSearchClient::failure(400, body.to_string(), SearchError::IndexCreationError);
        assert!(matches!(err, SearchError::IndexCreationError(ref m) if m.contains("502 Bad Gateway")));

        let err = OpenSearchClient::failure(502, body.to_string(), SearchError::IndexCreationError);
        assert!(matches!(err, SearchError::UnavailableError { ref body, .. } if body.contains("Bad Gateway")));
        assert!(err.is_transient());
    }
}
