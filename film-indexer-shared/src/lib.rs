//! # Film Indexer Shared
//!
//! Types shared by the film indexer crates: the entity kinds the source
//! database exposes, the checkpoint watermark, the aggregated row produced by
//! the source and the `Movie` document written to the search index.

mod aggregate;
mod entity_kind;
mod movie;
mod watermark;

pub use aggregate::{AggregateRow, PersonRef};
pub use entity_kind::{EntityKind, JoinRelation, UnknownEntityKind};
pub use movie::{Movie, Person, Role};
pub use watermark::{Watermark, WatermarkError};
