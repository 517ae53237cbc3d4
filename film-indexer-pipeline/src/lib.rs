//! # Film Indexer Pipeline
//!
//! This crate provides the stages that copy changed film works from the
//! Postgres source into the search index.
//!
//! ## Architecture
//!
//! Each entity kind runs through a push pipeline:
//!
//! 1. **Producer**: Polls changed ids since the last checkpoint
//! 2. **Enricher**: Resolves the film works of changed persons or genres
//! 3. **Merger**: Fetches one aggregated row per film work
//! 4. **Transformer**: Normalizes rows into `Movie` documents
//! 5. **Loader**: Bulk-writes documents into the search index
//! 6. **Orchestrator**: Wires the stages and runs every kind periodically
//!
//! Every stage hands its output to the next one through [`Sink::submit`] and
//! waits for it to complete before accepting more input.

pub mod enricher;
pub mod errors;
pub mod loader;
pub mod merger;
pub mod orchestrator;
pub mod producer;
pub mod retry;
pub mod stage;
pub mod transformer;

pub use errors::PipelineError;
pub use retry::{RetryError, RetryPolicy};
pub use stage::{Sink, Stage};

#[cfg(test)]
mod test_support;
