//! Request and response types for source and search index operations.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::SearchError;
use film_indexer_shared::Watermark;

/// One `(id, updated_at)` row returned by the change-detection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRow {
    pub id: Uuid,
    pub updated_at: DateTime<Utc>,
}

/// Position of a change-detection window.
///
/// The first window of a run starts at the committed watermark, inclusive.
/// Later windows continue strictly after the last `(updated_at, id)` pair
/// already handed downstream, so rows sharing one timestamp are never
/// fetched twice within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeCursor {
    /// Rows with `updated_at >= watermark`.
    Since(Watermark),
    /// Rows with `(updated_at, id) > (updated_at, id)`.
    After { updated_at: DateTime<Utc>, id: Uuid },
}

/// A serialized document ready for a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDocument {
    /// Document identifier in the index.
    pub id: String,
    /// Full document body.
    pub body: Value,
}

impl BulkDocument {
    /// Serialize any document into a bulk entry.
    pub fn from_serializable<T: serde::Serialize>(
        id: impl Into<String>,
        document: &T,
    ) -> Result<Self, SearchError> {
        let body =
            serde_json::to_value(document).map_err(|e| SearchError::serialization(e.to_string()))?;
        Ok(Self {
            id: id.into(),
            body,
        })
    }
}

/// Result of a batch operation for a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperationResult {
    /// The document identifier.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error object reported by the search engine if the operation failed.
    pub error: Option<Value>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// A bulk write succeeds or fails per document; callers decide what to do with
/// the failed entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item, in request order.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Iterate over the failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
