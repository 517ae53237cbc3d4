//! Dependency initialization and wiring for the film indexer.

use std::sync::Arc;

use tracing::info;

use crate::config::IndexerConfig;
use crate::IndexingError;
use film_indexer_pipeline::loader::SearchLoader;
use film_indexer_pipeline::orchestrator::{CheckpointStores, Orchestrator};
use film_indexer_repository::opensearch::IndexConfig;
use film_indexer_repository::{
    CheckpointStore, JsonFileCheckpointStore, OpenSearchClient, PostgresSource, SearchEngineClient,
    SourceRepository,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Connect to Postgres and the search engine and build the orchestrator.
    ///
    /// Both backends must pass a health check before the pipeline starts.
    pub async fn new(config: &IndexerConfig) -> Result<Self, IndexingError> {
        info!(
            postgres_host = %config.source.host,
            postgres_db = %config.source.dbname,
            search_url = %config.search_url,
            index = %config.index_name,
            state_dir = %config.state_dir.display(),
            "Initializing dependencies"
        );

        let source = PostgresSource::connect(&config.source).await?;
        if !source.health_check().await? {
            return Err(IndexingError::config("Postgres health check failed"));
        }
        info!("Postgres connection verified");

        let search_client = OpenSearchClient::new(&config.search_url)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create search client: {}", e)))?;

        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("Search engine health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("Search engine cluster is unhealthy"));
        }
        info!("Search engine connection verified");

        let index = match &config.index_schema_path {
            Some(path) => IndexConfig::from_schema_file(config.index_name.clone(), path)?,
            None => IndexConfig::movies(config.index_name.clone()),
        };

        let state_dir = config.state_dir.clone();
        let checkpoints = CheckpointStores::per_kind(|kind| {
            Arc::new(JsonFileCheckpointStore::for_kind(&state_dir, kind)) as Arc<dyn CheckpointStore>
        });

        let loader = SearchLoader::new(Arc::new(search_client), index, config.retry.clone());

        let orchestrator = Orchestrator::with_config(
            Arc::new(source),
            loader,
            checkpoints,
            config.retry.clone(),
            config.orchestrator.clone(),
        );

        Ok(Self { orchestrator })
    }
}
