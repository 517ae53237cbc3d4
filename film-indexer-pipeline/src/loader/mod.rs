//! Loader module for the film indexer pipeline.
//!
//! Bulk-writes movie documents into the search index.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument};

use crate::errors::PipelineError;
use crate::retry::RetryPolicy;
use crate::stage::{Sink, Stage};
use film_indexer_repository::opensearch::IndexConfig;
use film_indexer_repository::{BatchOperationSummary, BulkDocument, SearchEngineClient};
use film_indexer_shared::Movie;

/// Running totals of loader outcomes.
#[derive(Debug, Default)]
pub struct LoadMetrics {
    indexed: AtomicUsize,
    rejected: AtomicUsize,
}

impl LoadMetrics {
    fn record(&self, summary: &BatchOperationSummary) {
        self.indexed.fetch_add(summary.succeeded, Ordering::Relaxed);
        self.rejected.fetch_add(summary.failed, Ordering::Relaxed);
    }

    /// Documents accepted by the search engine.
    pub fn indexed(&self) -> usize {
        self.indexed.load(Ordering::Relaxed)
    }

    /// Documents the search engine rejected individually.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Loader that indexes movie documents into the search engine.
///
/// A batch is written with one bulk request. Transient request failures are
/// retried; documents rejected individually inside a successful request are
/// logged and counted but do not fail the batch.
#[derive(Clone)]
pub struct SearchLoader {
    client: Arc<dyn SearchEngineClient>,
    index: IndexConfig,
    retry: RetryPolicy,
    metrics: Arc<LoadMetrics>,
}

impl SearchLoader {
    /// Create a new search loader writing to `index`.
    pub fn new(client: Arc<dyn SearchEngineClient>, index: IndexConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            index,
            retry,
            metrics: Arc::new(LoadMetrics::default()),
        }
    }

    /// Loader sharing this one's client and index but counting into `metrics`.
    pub fn with_metrics(&self, metrics: Arc<LoadMetrics>) -> Self {
        Self {
            metrics,
            ..self.clone()
        }
    }

    pub fn metrics(&self) -> &Arc<LoadMetrics> {
        &self.metrics
    }

    pub fn index_name(&self) -> &str {
        &self.index.name
    }

    /// Create the index with its schema unless it already exists.
    pub async fn ensure_index(&self) -> Result<(), PipelineError> {
        let client = &self.client;
        let index = &self.index;

        let created = self
            .retry
            .run("create index", move || client.create_index(&index.name, &index.schema))
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))?;

        if created {
            info!(index = %self.index.name, "Created search index");
        } else {
            debug!(index = %self.index.name, "Search index already exists");
        }
        Ok(())
    }

    /// Drop the index and create it again from the schema.
    pub async fn recreate_index(&self) -> Result<(), PipelineError> {
        let client = &self.client;
        let name = self.index.name.as_str();

        let deleted = self
            .retry
            .run("delete index", move || client.delete_index(name))
            .await
            .map_err(|e| PipelineError::loader(e.to_string()))?;
        info!(index = %name, deleted = deleted, "Dropped search index");

        self.ensure_index().await
    }

    fn to_documents(movies: &[Movie]) -> Result<Vec<BulkDocument>, PipelineError> {
        movies
            .iter()
            .map(|movie| BulkDocument::from_serializable(movie.document_id(), movie))
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::stage(Stage::Loader, e))
    }
}

#[async_trait]
impl Sink<Vec<Movie>> for SearchLoader {
    #[instrument(skip(self, movies), fields(index = %self.index.name, count = movies.len()))]
    async fn submit(&mut self, movies: Vec<Movie>) -> Result<(), PipelineError> {
        if movies.is_empty() {
            return Ok(());
        }

        let documents = Self::to_documents(&movies)?;

        let summary = {
            let client = &self.client;
            let index = self.index.name.as_str();
            let documents = documents.as_slice();
            self.retry
                .run("bulk index", move || client.bulk_index(index, documents))
                .await
                .map_err(|e| PipelineError::stage(Stage::Loader, e))?
        };

        for failure in summary.failures() {
            let reason = failure
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            error!(
                document_id = %failure.document_id,
                error = %reason,
                "Document rejected by search engine"
            );
        }

        self.metrics.record(&summary);
        debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Loaded batch"
        );
        Ok(())
    }
}
