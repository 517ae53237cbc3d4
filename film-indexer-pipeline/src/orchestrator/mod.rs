//! Orchestrator module for the film indexer pipeline.
//!
//! Builds the stage chain for each entity kind and runs sync cycles until
//! shutdown.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::enricher::Enricher;
use crate::errors::PipelineError;
use crate::loader::{LoadMetrics, SearchLoader};
use crate::merger::Merger;
use crate::producer::{ChangeProducer, RunStats};
use crate::retry::RetryPolicy;
use crate::stage::Sink;
use crate::transformer::MovieTransformer;
use film_indexer_repository::{CheckpointStore, SourceRepository};
use film_indexer_shared::EntityKind;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of ids per batch at every windowed stage.
    pub batch_size: usize,
    /// Pause between two sync cycles.
    pub poll_interval: Duration,
    /// Stop after the first sync cycle.
    pub run_once: bool,
    /// Drop and recreate the index, and reset every checkpoint, before the first cycle.
    pub recreate_index: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_secs(60),
            run_once: false,
            recreate_index: false,
        }
    }
}

/// Checkpoint store per entity kind.
#[derive(Clone)]
pub struct CheckpointStores {
    stores: HashMap<EntityKind, Arc<dyn CheckpointStore>>,
}

impl CheckpointStores {
    /// One store holding every kind's watermark.
    pub fn shared(store: Arc<dyn CheckpointStore>) -> Self {
        Self::per_kind(|_| store.clone())
    }

    /// A dedicated store for each kind.
    pub fn per_kind<F>(mut make: F) -> Self
    where
        F: FnMut(EntityKind) -> Arc<dyn CheckpointStore>,
    {
        let stores = EntityKind::ALL.iter().map(|&kind| (kind, make(kind))).collect();
        Self { stores }
    }

    pub fn get(&self, kind: EntityKind) -> Result<Arc<dyn CheckpointStore>, PipelineError> {
        self.stores
            .get(&kind)
            .cloned()
            .ok_or_else(|| PipelineError::processor(format!("no checkpoint store for {}", kind)))
    }
}

/// Orchestrator that coordinates the pipeline components.
///
/// The orchestrator:
/// - Makes sure the search index exists before the first cycle
/// - Runs every entity kind once per cycle, in a fixed order
/// - Keeps going with the remaining kinds when one kind fails
/// - Handles shutdown signals between cycles
pub struct Orchestrator {
    source: Arc<dyn SourceRepository>,
    loader: SearchLoader,
    checkpoints: CheckpointStores,
    retry: RetryPolicy,
    config: OrchestratorConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        source: Arc<dyn SourceRepository>,
        loader: SearchLoader,
        checkpoints: CheckpointStores,
        retry: RetryPolicy,
    ) -> Self {
        Self::with_config(source, loader, checkpoints, retry, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        source: Arc<dyn SourceRepository>,
        loader: SearchLoader,
        checkpoints: CheckpointStores,
        retry: RetryPolicy,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            source,
            loader,
            checkpoints,
            retry,
            config,
            shutdown_tx,
        }
    }

    /// Build the stage chain that receives the producer's id batches.
    fn build_chain(&self, kind: EntityKind, metrics: Arc<LoadMetrics>) -> Box<dyn Sink<Vec<Uuid>>> {
        let loader = self.loader.with_metrics(metrics);
        let transformer = MovieTransformer::new(Box::new(loader));
        let merger = Merger::new(self.source.clone(), self.retry.clone(), Box::new(transformer));

        match kind.join_relation() {
            None => Box::new(merger),
            Some(relation) => Box::new(Enricher::new(
                relation,
                self.source.clone(),
                self.retry.clone(),
                self.config.batch_size,
                Box::new(merger),
            )),
        }
    }

    /// Run the pipeline for one entity kind until its changes are drained.
    #[instrument(skip(self))]
    pub async fn run_kind(&self, kind: EntityKind) -> Result<RunStats, PipelineError> {
        let metrics = Arc::new(LoadMetrics::default());
        let mut chain = self.build_chain(kind, metrics.clone());
        let producer = ChangeProducer::new(
            kind,
            self.source.clone(),
            self.checkpoints.get(kind)?,
            self.retry.clone(),
            self.config.batch_size,
        );

        let stats = producer.run(chain.as_mut()).await?;

        info!(
            kind = %kind,
            batches = stats.batches,
            changed = stats.ids,
            indexed = metrics.indexed(),
            rejected = metrics.rejected(),
            "Entity kind synchronized"
        );
        Ok(stats)
    }

    /// Run every entity kind once.
    ///
    /// A failing kind is logged and skipped; the remaining kinds still run.
    pub async fn run_cycle(&self) -> Result<(), PipelineError> {
        let mut failed = Vec::new();

        for kind in EntityKind::ALL {
            if let Err(e) = self.run_kind(kind).await {
                error!(kind = %kind, error = %e, "Entity kind sync failed");
                failed.push(kind);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::CycleFailed { kinds: failed })
        }
    }

    /// Drop the index and forget every checkpoint so the next cycle reindexes everything.
    pub async fn reset(&self) -> Result<(), PipelineError> {
        self.loader.recreate_index().await?;
        for kind in EntityKind::ALL {
            self.checkpoints.get(kind)?.reset(kind)?;
        }
        info!("Index recreated and checkpoints reset");
        Ok(())
    }

    /// Run the orchestrator until Ctrl-C.
    ///
    /// Runs sync cycles every `poll_interval` until a shutdown signal is
    /// received. With `run_once` set, returns the result of the first cycle.
    pub async fn run(&self) -> Result<(), PipelineError> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Run sync cycles until `signal` resolves or [`Orchestrator::shutdown`] is called.
    ///
    /// A signal that arrives mid-cycle lets the cycle finish and commit its
    /// checkpoints, then stops before the next one.
    #[instrument(skip(self, signal))]
    pub async fn run_until<S>(&self, signal: S) -> Result<(), PipelineError>
    where
        S: Future + Send,
    {
        info!(
            index = %self.loader.index_name(),
            batch_size = self.config.batch_size,
            "Starting film indexer orchestrator"
        );

        if self.config.recreate_index {
            self.reset().await?;
        } else {
            self.loader.ensure_index().await?;
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::pin!(signal);
        let mut interrupted = false;

        loop {
            let cycle = self.run_cycle();
            tokio::pin!(cycle);
            let result = loop {
                tokio::select! {
                    result = &mut cycle => break result,
                    _ = &mut signal, if !interrupted => {
                        info!("Received shutdown signal, finishing current cycle");
                        interrupted = true;
                    }
                }
            };

            if self.config.run_once {
                info!("Single cycle complete");
                return result;
            }
            if let Err(e) = result {
                warn!(error = %e, "Sync cycle finished with errors");
            }

            if interrupted || *shutdown_rx.borrow_and_update() {
                info!("Shutdown requested");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown_rx.changed() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = &mut signal => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Trigger a graceful shutdown after the current cycle.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}
