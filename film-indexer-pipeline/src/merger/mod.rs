//! Merger module for the film indexer pipeline.
//!
//! Turns a batch of film work ids into one aggregated row per film work.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::retry::RetryPolicy;
use crate::stage::{Sink, Stage};
use film_indexer_repository::SourceRepository;
use film_indexer_shared::AggregateRow;

/// Fetches denormalized film work rows for a batch of ids.
///
/// The whole result set is forwarded as one batch.
pub struct Merger {
    source: Arc<dyn SourceRepository>,
    retry: RetryPolicy,
    downstream: Box<dyn Sink<Vec<AggregateRow>>>,
}

impl Merger {
    pub fn new(
        source: Arc<dyn SourceRepository>,
        retry: RetryPolicy,
        downstream: Box<dyn Sink<Vec<AggregateRow>>>,
    ) -> Self {
        Self {
            source,
            retry,
            downstream,
        }
    }
}

#[async_trait]
impl Sink<Vec<Uuid>> for Merger {
    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    async fn submit(&mut self, ids: Vec<Uuid>) -> Result<(), PipelineError> {
        if ids.is_empty() {
            return Ok(());
        }

        let rows = {
            let source = &self.source;
            let ids = ids.as_slice();
            self.retry
                .run("aggregate film works", move || source.aggregate_filmworks(ids))
                .await
                .map_err(|e| PipelineError::stage(Stage::Merger, e))?
        };

        if rows.is_empty() {
            // Ids removed from the source between change detection and merge.
            warn!(id_count = ids.len(), "No film works found for changed ids");
            return Ok(());
        }

        debug!(count = rows.len(), "Merged film work rows");
        self.downstream.submit(rows).await
    }
}
