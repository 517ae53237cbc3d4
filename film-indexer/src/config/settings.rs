//! Indexer settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use film_indexer_pipeline::orchestrator::OrchestratorConfig;
use film_indexer_pipeline::RetryPolicy;
use film_indexer_repository::opensearch::DEFAULT_INDEX_NAME;
use film_indexer_repository::SourceConfig;

/// Default search engine URL.
const DEFAULT_ELASTICSEARCH_URL: &str = "http://127.0.0.1:9200";

/// Default directory holding the per-kind checkpoint files.
const DEFAULT_STATE_DIR: &str = "./state";

const DEFAULT_POSTGRES_HOST: &str = "localhost";
const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_BATCH_LIMIT: usize = 100;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 100;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 10_000;

/// Everything the indexer needs to start.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub source: SourceConfig,
    pub search_url: String,
    pub index_name: String,
    /// Optional JSON file replacing the built-in index mapping.
    pub index_schema_path: Option<PathBuf>,
    pub state_dir: PathBuf,
    pub orchestrator: OrchestratorConfig,
    pub retry: RetryPolicy,
}

impl IndexerConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ETL_POSTGRES_DBNAME`, `ETL_POSTGRES_USER`, `ETL_POSTGRES_PASSWORD`: required
    /// - `ETL_POSTGRES_HOST` (default: localhost), `ETL_POSTGRES_PORT` (default: 5432)
    /// - `ETL_ELASTICSEARCH_URL` (default: http://127.0.0.1:9200)
    /// - `ETL_ELASTICSEARCH_INDEX_NAME` (default: movies)
    /// - `ETL_INDEX_SCHEMA_PATH`: optional mapping file
    /// - `ETL_BATCH_LIMIT` (default: 100)
    /// - `ETL_STATE_DIR` (default: ./state)
    /// - `ETL_POLL_INTERVAL_SECS` (default: 60)
    /// - `ETL_RUN_ONCE`, `ETL_RECREATE_INDEX` (default: false)
    /// - `ETL_RETRY_MAX_ATTEMPTS` (default: 5)
    /// - `ETL_RETRY_INITIAL_DELAY_MS` (default: 100), `ETL_RETRY_MAX_DELAY_MS` (default: 10000)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let mut source = SourceConfig::new(
            vars.required("ETL_POSTGRES_DBNAME")?,
            vars.required("ETL_POSTGRES_USER")?,
            vars.required("ETL_POSTGRES_PASSWORD")?,
        );
        source.host = vars.string("ETL_POSTGRES_HOST", DEFAULT_POSTGRES_HOST);
        source.port = vars.parsed("ETL_POSTGRES_PORT", DEFAULT_POSTGRES_PORT)?;

        let batch_size: usize = vars.parsed("ETL_BATCH_LIMIT", DEFAULT_BATCH_LIMIT)?;
        if batch_size == 0 {
            return Err(IndexingError::config("ETL_BATCH_LIMIT must be greater than 0"));
        }

        let orchestrator = OrchestratorConfig {
            batch_size,
            poll_interval: Duration::from_secs(
                vars.parsed("ETL_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            ),
            run_once: vars.flag("ETL_RUN_ONCE")?,
            recreate_index: vars.flag("ETL_RECREATE_INDEX")?,
        };

        let retry = RetryPolicy {
            max_attempts: vars.parsed("ETL_RETRY_MAX_ATTEMPTS", DEFAULT_RETRY_MAX_ATTEMPTS)?,
            initial_delay: Duration::from_millis(
                vars.parsed("ETL_RETRY_INITIAL_DELAY_MS", DEFAULT_RETRY_INITIAL_DELAY_MS)?,
            ),
            max_delay: Duration::from_millis(
                vars.parsed("ETL_RETRY_MAX_DELAY_MS", DEFAULT_RETRY_MAX_DELAY_MS)?,
            ),
            ..RetryPolicy::default()
        };

        Ok(Self {
            source,
            search_url: vars.string("ETL_ELASTICSEARCH_URL", DEFAULT_ELASTICSEARCH_URL),
            index_name: vars.string("ETL_ELASTICSEARCH_INDEX_NAME", DEFAULT_INDEX_NAME),
            index_schema_path: vars.get("ETL_INDEX_SCHEMA_PATH").map(PathBuf::from),
            state_dir: PathBuf::from(vars.string("ETL_STATE_DIR", DEFAULT_STATE_DIR)),
            orchestrator,
            retry,
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, IndexingError> {
        self.get(key)
            .ok_or_else(|| IndexingError::config(format!("{} is not set", key)))
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, IndexingError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| IndexingError::config(format!("{}={:?}: {}", key, raw, e))),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, IndexingError> {
        match self.get(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
            Some(v) => Err(IndexingError::config(format!("{}={:?} is not a boolean", key, v))),
        }
    }
}
