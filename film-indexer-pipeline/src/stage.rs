//! Stage hand-off interface.

use std::fmt;

use async_trait::async_trait;

use crate::errors::PipelineError;

/// Receiving side of a pipeline stage.
///
/// `submit` returns once the batch and everything derived from it has been
/// consumed by all downstream stages, which gives the pipeline its
/// backpressure: an upstream stage cannot fetch more input while a previous
/// batch is still in flight.
#[async_trait]
pub trait Sink<T: Send + 'static>: Send {
    async fn submit(&mut self, batch: T) -> Result<(), PipelineError>;
}

/// Names of the pipeline stages, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Producer,
    Enricher,
    Merger,
    Transformer,
    Loader,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Producer => "producer",
            Stage::Enricher => "enricher",
            Stage::Merger => "merger",
            Stage::Transformer => "transformer",
            Stage::Loader => "loader",
        };
        f.write_str(name)
    }
}
