//! Error types for the film indexer pipeline.

use thiserror::Error;

use crate::stage::Stage;
use film_indexer_repository::CheckpointError;
use film_indexer_shared::EntityKind;

/// Errors that can occur in the film indexer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage gave up on an I/O call, aborting the current run.
    #[error("{stage} stage failed: {message}")]
    StageFailed { stage: Stage, message: String },

    /// Reading or writing the checkpoint failed.
    #[error("Checkpoint error: {0}")]
    CheckpointError(#[from] CheckpointError),

    /// Error from the loader component outside of a batch (index management).
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Data or wiring did not satisfy a stage's expectations.
    #[error("Processor error: {0}")]
    ProcessorError(String),

    /// One or more entity kinds failed during a sync cycle.
    #[error("Sync cycle failed for: {}", format_kinds(.kinds))]
    CycleFailed { kinds: Vec<EntityKind> },
}

fn format_kinds(kinds: &[EntityKind]) -> String {
    kinds
        .iter()
        .map(EntityKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipelineError {
    /// Create a stage failure.
    pub fn stage(stage: Stage, err: impl std::fmt::Display) -> Self {
        Self::StageFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a processor error.
    pub fn processor(msg: impl Into<String>) -> Self {
        Self::ProcessorError(msg.into())
    }
}
