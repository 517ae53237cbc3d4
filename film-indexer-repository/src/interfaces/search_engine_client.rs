//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;
use crate::types::{BatchOperationSummary, BulkDocument};

/// Abstract interface for search engine operations.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
///
/// # Error Handling
///
/// Transport failures and overloaded responses are reported as transient
/// [`SearchError`]s. Failures of individual documents inside a bulk write
/// are not errors; they are reported in the returned summary.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Upsert documents in a single bulk request.
    ///
    /// # Arguments
    ///
    /// * `index` - Target index name
    /// * `documents` - Documents to write, keyed by their id
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome, in request order
    /// * `Err(SearchError)` - If the bulk request itself failed
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchError>;

    /// Check whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create the index with the given settings and mappings.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was created
    /// * `Ok(false)` - If the index already existed
    async fn create_index(&self, index: &str, schema: &Value) -> Result<bool, SearchError>;

    /// Delete the index.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the index was deleted
    /// * `Ok(false)` - If the index did not exist
    async fn delete_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
