//! Error types for the film indexer repository.

mod checkpoint_error;
mod search_error;
mod source_error;

pub use checkpoint_error::CheckpointError;
pub use search_error::SearchError;
pub use source_error::SourceError;

/// Classifies errors that may succeed when the same call is repeated.
///
/// Network drops, timeouts and overloaded servers are transient. Rejected
/// queries, malformed responses and serialization failures are not.
pub trait Transient {
    fn is_transient(&self) -> bool;
}
