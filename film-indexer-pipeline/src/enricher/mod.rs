//! Enricher module for the film indexer pipeline.
//!
//! Maps ids of changed persons or genres to the film works that reference
//! them, so that those film works get re-indexed.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::retry::RetryPolicy;
use crate::stage::{Sink, Stage};
use film_indexer_repository::SourceRepository;
use film_indexer_shared::JoinRelation;

/// Resolves secondary entity ids to film work ids through a join table.
///
/// Every incoming batch is fully drained: related film work ids are fetched
/// in keyset windows of at most `batch_size` ids and each window is handed
/// downstream before the next one is fetched.
pub struct Enricher {
    relation: JoinRelation,
    source: Arc<dyn SourceRepository>,
    retry: RetryPolicy,
    batch_size: usize,
    downstream: Box<dyn Sink<Vec<Uuid>>>,
}

impl Enricher {
    pub fn new(
        relation: JoinRelation,
        source: Arc<dyn SourceRepository>,
        retry: RetryPolicy,
        batch_size: usize,
        downstream: Box<dyn Sink<Vec<Uuid>>>,
    ) -> Self {
        Self {
            relation,
            source,
            retry,
            batch_size,
            downstream,
        }
    }
}

#[async_trait]
impl Sink<Vec<Uuid>> for Enricher {
    #[instrument(skip(self, ids), fields(table = self.relation.table, id_count = ids.len()))]
    async fn submit(&mut self, ids: Vec<Uuid>) -> Result<(), PipelineError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut after: Option<Uuid> = None;
        loop {
            let window = {
                let source = &self.source;
                let relation = self.relation;
                let ids = ids.as_slice();
                let limit = self.batch_size;
                self.retry
                    .run("fetch related film works", move || {
                        source.related_filmwork_ids(relation, ids, after, limit)
                    })
                    .await
                    .map_err(|e| PipelineError::stage(Stage::Enricher, e))?
            };

            let Some(&last) = window.last() else {
                break;
            };
            let exhausted = window.len() < self.batch_size;

            debug!(count = window.len(), "Resolved related film works");
            self.downstream.submit(window).await?;

            if exhausted {
                break;
            }
            after = Some(last);
        }

        Ok(())
    }
}
