//! Checkpoint store trait definition.

use crate::errors::CheckpointError;
use film_indexer_shared::{EntityKind, Watermark};

/// Persists the last processed watermark per entity kind.
///
/// Implementations are not required to be safe against concurrent writers
/// for the same kind; the pipeline runs kinds sequentially.
pub trait CheckpointStore: Send + Sync {
    /// Return the stored watermark, or [`Watermark::epoch`] if none exists.
    fn get(&self, kind: EntityKind) -> Result<Watermark, CheckpointError>;

    /// Record a new watermark.
    ///
    /// A watermark older than the stored one is ignored so the stored value
    /// never moves backwards.
    fn set(&self, kind: EntityKind, watermark: &Watermark) -> Result<(), CheckpointError>;

    /// Forget the watermark of a kind so the next run starts from epoch.
    fn reset(&self, kind: EntityKind) -> Result<(), CheckpointError>;
}
