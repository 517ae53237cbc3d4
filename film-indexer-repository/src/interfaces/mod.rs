//! Interface definitions for the film indexer repositories.
//!
//! The pipeline only talks to these traits, which allows for dependency
//! injection and in-memory implementations in tests.

mod checkpoint_store;
mod search_engine_client;
mod source_repository;

pub use checkpoint_store::CheckpointStore;
pub use search_engine_client::SearchEngineClient;
pub use source_repository::SourceRepository;
