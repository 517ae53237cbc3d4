//! In-memory collaborators shared by the stage tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::stage::Sink;
use film_indexer_repository::{
    BatchOperationResult, BatchOperationSummary, BulkDocument, ChangeCursor, ChangedRow,
    SearchEngineClient, SearchError, SourceError, SourceRepository,
};
use film_indexer_shared::{AggregateRow, EntityKind, JoinRelation};

/// Timestamp `offset` seconds after a fixed base.
pub fn ts(offset: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset, 0).unwrap()
}

/// Sink that records every batch it receives. Clones share the record.
#[derive(Clone)]
pub struct CollectingSink<T> {
    received: Arc<Mutex<Vec<T>>>,
}

impl<T> Default for CollectingSink<T> {
    fn default() -> Self {
        Self {
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> CollectingSink<T> {
    pub fn batches(&self) -> Vec<T> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T: Send + 'static> Sink<T> for CollectingSink<T> {
    async fn submit(&mut self, batch: T) -> Result<(), PipelineError> {
        self.received.lock().unwrap().push(batch);
        Ok(())
    }
}

/// Sink that accepts a number of batches and fails afterwards.
pub struct FailingSink {
    remaining: usize,
}

impl FailingSink {
    pub fn after(accepted: usize) -> Self {
        Self { remaining: accepted }
    }
}

#[async_trait]
impl Sink<Vec<Uuid>> for FailingSink {
    async fn submit(&mut self, _batch: Vec<Uuid>) -> Result<(), PipelineError> {
        if self.remaining == 0 {
            return Err(PipelineError::processor("downstream failure"));
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// In-memory source database.
#[derive(Default)]
pub struct MockSource {
    changes: Mutex<HashMap<EntityKind, Vec<ChangedRow>>>,
    links: Mutex<HashMap<&'static str, Vec<(Uuid, Uuid)>>>,
    filmworks: Mutex<HashMap<Uuid, AggregateRow>>,
    broken_kinds: Mutex<HashSet<EntityKind>>,
    failures: AtomicUsize,
    latency_ms: AtomicU64,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_change(&self, kind: EntityKind, id: Uuid, updated_at: DateTime<Utc>) {
        self.changes
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(ChangedRow { id, updated_at });
    }

    pub fn link(&self, relation: JoinRelation, secondary: Uuid, filmwork: Uuid) {
        self.links
            .lock()
            .unwrap()
            .entry(relation.table)
            .or_default()
            .push((secondary, filmwork));
    }

    pub fn add_filmwork(&self, row: AggregateRow) {
        self.filmworks.lock().unwrap().insert(row.id, row);
    }

    /// Fail the next `count` calls with a connection error.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Delay every change query by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Fail every change query for `kind` with a query error.
    pub fn fail_kind(&self, kind: EntityKind) {
        self.broken_kinds.lock().unwrap().insert(kind);
    }

    fn take_failure(&self) -> Result<(), SourceError> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(SourceError::connection("connection reset")),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl SourceRepository for MockSource {
    async fn changed_rows(
        &self,
        kind: EntityKind,
        cursor: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, SourceError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.take_failure()?;
        if self.broken_kinds.lock().unwrap().contains(&kind) {
            return Err(SourceError::query("relation does not exist"));
        }

        let mut rows: Vec<ChangedRow> = self
            .changes
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| match cursor {
                ChangeCursor::Since(watermark) => row.updated_at >= watermark.to_timestamp().unwrap(),
                ChangeCursor::After { updated_at, id } => (row.updated_at, row.id) > (*updated_at, *id),
            })
            .collect();
        rows.sort_by_key(|row| (row.updated_at, row.id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn related_filmwork_ids(
        &self,
        relation: JoinRelation,
        ids: &[Uuid],
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Uuid>, SourceError> {
        self.take_failure()?;

        let links = self.links.lock().unwrap();
        let related: BTreeSet<Uuid> = links
            .get(relation.table)
            .map(|pairs| {
                pairs
                    .iter()
                    .filter(|(secondary, _)| ids.contains(secondary))
                    .map(|(_, filmwork)| *filmwork)
                    .filter(|filmwork| after.map_or(true, |last| *filmwork > last))
                    .collect()
            })
            .unwrap_or_default();
        Ok(related.into_iter().take(limit).collect())
    }

    async fn aggregate_filmworks(&self, ids: &[Uuid]) -> Result<Vec<AggregateRow>, SourceError> {
        self.take_failure()?;

        let filmworks = self.filmworks.lock().unwrap();
        let unique: BTreeSet<&Uuid> = ids.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| filmworks.get(id).cloned())
            .collect())
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        Ok(true)
    }
}

/// In-memory search engine with a single document namespace.
#[derive(Default)]
pub struct MockSearch {
    documents: Mutex<BTreeMap<String, Value>>,
    indices: Mutex<HashSet<String>>,
    rejected: Mutex<HashSet<String>>,
    failures: AtomicUsize,
    bulk_calls: AtomicUsize,
    created: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the document with this id inside every bulk request.
    pub fn reject(&self, id: &str) {
        self.rejected.lock().unwrap().insert(id.to_string());
    }

    /// Fail the next `count` bulk requests as unavailable.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn documents(&self) -> BTreeMap<String, Value> {
        self.documents.lock().unwrap().clone()
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indices.lock().unwrap().contains(name)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn created_indices(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchEngineClient for MockSearch {
    async fn bulk_index(
        &self,
        _index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SearchError::from_status(503, "unavailable".to_string(), SearchError::BulkIndexError));
        }

        let rejected = self.rejected.lock().unwrap();
        let mut stored = self.documents.lock().unwrap();
        let results = documents
            .iter()
            .map(|doc| {
                let success = !rejected.contains(&doc.id);
                if success {
                    stored.insert(doc.id.clone(), doc.body.clone());
                }
                BatchOperationResult {
                    document_id: doc.id.clone(),
                    success,
                    error: (!success).then(|| json!({"type": "mapper_parsing_exception"})),
                }
            })
            .collect();
        Ok(BatchOperationSummary::from_results(results))
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        Ok(self.has_index(index))
    }

    async fn create_index(&self, index: &str, _schema: &Value) -> Result<bool, SearchError> {
        let created = self.indices.lock().unwrap().insert(index.to_string());
        if created {
            self.created.fetch_add(1, Ordering::SeqCst);
        }
        Ok(created)
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        let deleted = self.indices.lock().unwrap().remove(index);
        if deleted {
            self.documents.lock().unwrap().clear();
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        Ok(true)
    }
}
