//! Bulk request encoding and response decoding.
//!
//! A bulk body is newline-delimited JSON: for each document an action line
//! `{"index": {"_index": ..., "_id": ...}}` followed by the document body.

use opensearch::http::request::JsonBody;
use serde_json::{json, Value};

use crate::errors::SearchError;
use crate::types::{BatchOperationResult, BatchOperationSummary, BulkDocument};

/// Alternating action/body lines for one bulk write.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    lines: Vec<Value>,
}

impl BulkRequest {
    /// Build the upsert lines for `documents` in `index`.
    pub fn new(index: &str, documents: &[BulkDocument]) -> Self {
        let mut lines = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            lines.push(json!({"index": {"_index": index, "_id": doc.id}}));
            lines.push(doc.body.clone());
        }
        Self { lines }
    }

    /// Convert into the body type expected by the OpenSearch client.
    pub fn into_body(self) -> Vec<JsonBody<Value>> {
        self.lines.into_iter().map(JsonBody::from).collect()
    }
}

/// Read the per-item outcome of a bulk response.
///
/// Item `i` of the `items` array reports on document `i` of the request.
/// Each item is an object keyed by the action name whose value may carry an
/// `error` object.
pub fn parse_bulk_response(
    response: &Value,
    documents: &[BulkDocument],
) -> Result<BatchOperationSummary, SearchError> {
    let items = response
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::parse("bulk response has no items array"))?;

    if items.len() != documents.len() {
        return Err(SearchError::parse(format!(
            "bulk response has {} items for {} documents",
            items.len(),
            documents.len()
        )));
    }

    let results = items
        .iter()
        .zip(documents)
        .map(|(item, doc)| {
            let outcome = item.as_object().and_then(|actions| actions.values().next());
            let document_id = outcome
                .and_then(|o| o.get("_id"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| doc.id.clone());
            let error = outcome.and_then(|o| o.get("error")).cloned();

            BatchOperationResult {
                document_id,
                success: error.is_none(),
                error,
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}
