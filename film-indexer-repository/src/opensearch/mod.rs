//! OpenSearch implementation of the search engine client.
//!
//! This module provides a concrete implementation of `SearchEngineClient`
//! using OpenSearch as the backend.

mod bulk;
mod client;
mod index_config;

pub use bulk::{parse_bulk_response, BulkRequest};
pub use client::OpenSearchClient;
pub use index_config::{movies_index_settings, IndexConfig, DEFAULT_INDEX_NAME};
