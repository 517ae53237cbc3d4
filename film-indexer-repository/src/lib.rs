//! # Film Indexer Repository
//!
//! This crate provides the traits and implementations the film indexer uses
//! to talk to the outside world: the Postgres source, the checkpoint store and
//! the search engine. Concrete implementations use `sqlx` for Postgres, a JSON
//! file for checkpoints and OpenSearch for the index.

pub mod checkpoint;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use checkpoint::{JsonFileCheckpointStore, MemoryCheckpointStore};
pub use config::SourceConfig;
pub use errors::{CheckpointError, SearchError, SourceError, Transient};
pub use interfaces::{CheckpointStore, SearchEngineClient, SourceRepository};
pub use opensearch::OpenSearchClient;
pub use postgres::PostgresSource;
pub use types::{BatchOperationResult, BatchOperationSummary, BulkDocument, ChangeCursor, ChangedRow};
