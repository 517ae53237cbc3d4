//! Producer module for the film indexer pipeline.
//!
//! Polls the source for rows of one entity kind changed since the stored
//! checkpoint and pushes their ids downstream, one batch at a time.

mod change_producer;

pub use change_producer::{ChangeProducer, RunStats};
