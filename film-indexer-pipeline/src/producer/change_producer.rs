//! Change producer implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::retry::RetryPolicy;
use crate::stage::{Sink, Stage};
use film_indexer_repository::{ChangeCursor, ChangedRow, CheckpointStore, SourceRepository};
use film_indexer_shared::{EntityKind, Watermark};

/// Outcome of one producer run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Number of batches handed downstream.
    pub batches: usize,
    /// Number of changed ids handed downstream.
    pub ids: usize,
    /// Watermark committed after the last batch, if any batch was produced.
    pub watermark: Option<Watermark>,
}

/// One window of changed rows, ready to be handed downstream.
struct ChangedBatch {
    ids: Vec<Uuid>,
    last_updated_at: DateTime<Utc>,
    last_id: Uuid,
}

impl ChangedBatch {
    fn from_rows(rows: Vec<ChangedRow>) -> Option<Self> {
        let last = rows.last()?;
        let (last_updated_at, last_id) = (last.updated_at, last.id);
        Some(Self {
            ids: rows.into_iter().map(|row| row.id).collect(),
            last_updated_at,
            last_id,
        })
    }

    fn watermark(&self) -> Watermark {
        Watermark::from_timestamp(self.last_updated_at)
    }

    fn next_cursor(&self) -> ChangeCursor {
        ChangeCursor::After {
            updated_at: self.last_updated_at,
            id: self.last_id,
        }
    }
}

/// Producer for one entity kind.
///
/// The first window of a run selects rows with `updated_at >= checkpoint`, so
/// rows sharing the checkpoint timestamp are delivered again after a restart.
/// Later windows continue strictly after the last `(updated_at, id)` seen,
/// which guarantees the run ends once the table is drained.
pub struct ChangeProducer {
    kind: EntityKind,
    source: Arc<dyn SourceRepository>,
    checkpoints: Arc<dyn CheckpointStore>,
    retry: RetryPolicy,
    batch_size: usize,
}

impl ChangeProducer {
    pub fn new(
        kind: EntityKind,
        source: Arc<dyn SourceRepository>,
        checkpoints: Arc<dyn CheckpointStore>,
        retry: RetryPolicy,
        batch_size: usize,
    ) -> Self {
        Self {
            kind,
            source,
            checkpoints,
            retry,
            batch_size,
        }
    }

    /// Drain all changes since the stored checkpoint into `downstream`.
    ///
    /// The checkpoint is advanced to a batch's largest `updated_at` only after
    /// `downstream` has accepted the batch. A failing batch leaves the
    /// checkpoint where it was, so the next run starts from the same rows.
    #[instrument(skip(self, downstream), fields(kind = %self.kind))]
    pub async fn run(&self, downstream: &mut dyn Sink<Vec<Uuid>>) -> Result<RunStats, PipelineError> {
        let start = self.checkpoints.get(self.kind)?;
        info!(watermark = %start, "Polling for changes");

        let mut cursor = ChangeCursor::Since(start);
        let mut stats = RunStats::default();

        loop {
            let rows = self.fetch_window(&cursor).await?;
            let Some(batch) = ChangedBatch::from_rows(rows) else {
                break;
            };

            let watermark = batch.watermark();
            let next_cursor = batch.next_cursor();
            let count = batch.ids.len();

            downstream.submit(batch.ids).await?;
            self.checkpoints.set(self.kind, &watermark)?;

            debug!(count = count, watermark = %watermark, "Batch committed");
            stats.batches += 1;
            stats.ids += count;
            stats.watermark = Some(watermark);
            cursor = next_cursor;
        }

        info!(
            batches = stats.batches,
            ids = stats.ids,
            "Producer run complete"
        );
        Ok(stats)
    }

    async fn fetch_window(&self, cursor: &ChangeCursor) -> Result<Vec<ChangedRow>, PipelineError> {
        let source = &self.source;
        let kind = self.kind;
        let limit = self.batch_size;

        self.retry
            .run("fetch changed rows", move || source.changed_rows(kind, cursor, limit))
            .await
            .map_err(|e| PipelineError::stage(Stage::Producer, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ts, CollectingSink, FailingSink, MockSource};
    use film_indexer_repository::MemoryCheckpointStore;

    fn producer(source: Arc<MockSource>, checkpoints: Arc<MemoryCheckpointStore>, batch_size: usize) -> ChangeProducer {
        ChangeProducer::new(
            EntityKind::Filmwork,
            source,
            checkpoints,
            RetryPolicy::no_retry(),
            batch_size,
        )
    }

    #[tokio::test]
    async fn test_drains_all_changes_in_batches() {
        let source = Arc::new(MockSource::new());
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            source.add_change(EntityKind::Filmwork, *id, ts(i as i64 + 1));
        }
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut sink = CollectingSink::<Vec<Uuid>>::default();

        let stats = producer(source, checkpoints.clone(), 2).run(&mut sink).await.unwrap();

        assert_eq!(stats.batches, 3);
        assert_eq!(stats.ids, 5);
        assert_eq!(sink.batches().len(), 3);
        assert!(sink.batches().iter().all(|b| b.len() <= 2));
        assert_eq!(sink.batches().concat(), ids);
        assert_eq!(
            checkpoints.get(EntityKind::Filmwork).unwrap(),
            Watermark::from_timestamp(ts(5))
        );
    }

    #[tokio::test]
    async fn test_rows_sharing_a_timestamp_are_not_lost() {
        let source = Arc::new(MockSource::new());
        let mut ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        for id in &ids {
            source.add_change(EntityKind::Filmwork, *id, ts(1));
        }
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut sink = CollectingSink::<Vec<Uuid>>::default();

        producer(source, checkpoints, 3).run(&mut sink).await.unwrap();

        assert_eq!(sink.batches().concat(), ids);
    }

    #[tokio::test]
    async fn test_restart_rereads_rows_at_checkpoint() {
        let source = Arc::new(MockSource::new());
        let at_checkpoint = Uuid::new_v4();
        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        source.add_change(EntityKind::Filmwork, older, ts(1));
        source.add_change(EntityKind::Filmwork, at_checkpoint, ts(2));
        source.add_change(EntityKind::Filmwork, newer, ts(3));

        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        checkpoints
            .set(EntityKind::Filmwork, &Watermark::from_timestamp(ts(2)))
            .unwrap();
        let mut sink = CollectingSink::<Vec<Uuid>>::default();

        producer(source, checkpoints, 10).run(&mut sink).await.unwrap();

        assert_eq!(sink.batches().concat(), vec![at_checkpoint, newer]);
    }

    #[tokio::test]
    async fn test_no_changes_leaves_checkpoint_untouched() {
        let source = Arc::new(MockSource::new());
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut sink = CollectingSink::<Vec<Uuid>>::default();

        let stats = producer(source, checkpoints.clone(), 10).run(&mut sink).await.unwrap();

        assert_eq!(stats, RunStats::default());
        assert!(sink.batches().is_empty());
        assert_eq!(checkpoints.get(EntityKind::Filmwork).unwrap(), Watermark::epoch());
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_advance_checkpoint() {
        let source = Arc::new(MockSource::new());
        for i in 0..4 {
            source.add_change(EntityKind::Filmwork, Uuid::new_v4(), ts(i + 1));
        }
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut sink = FailingSink::after(1);

        let result = producer(source, checkpoints.clone(), 2).run(&mut sink).await;

        assert!(result.is_err());
        assert_eq!(
            checkpoints.get(EntityKind::Filmwork).unwrap(),
            Watermark::from_timestamp(ts(2))
        );
    }

    #[tokio::test]
    async fn test_source_failure_is_a_stage_error() {
        let source = Arc::new(MockSource::new());
        source.fail_next(1);
        let checkpoints = Arc::new(MemoryCheckpointStore::new());
        let mut sink = CollectingSink::<Vec<Uuid>>::default();

        let err = producer(source, checkpoints, 2).run(&mut sink).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StageFailed {
                stage: Stage::Producer,
                ..
            }
        ));
    }
}
