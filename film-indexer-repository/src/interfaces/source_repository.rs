//! Source repository trait definition.
//!
//! This module defines the three queries the pipeline runs against the
//! relational source.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::SourceError;
use crate::types::{ChangeCursor, ChangedRow};
use film_indexer_shared::{AggregateRow, EntityKind, JoinRelation};

/// Abstract interface for the relational source.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Fetch the next window of changed rows of a kind.
    ///
    /// Rows are ordered by `(updated_at, id)` ascending and at most `limit`
    /// rows are returned. An empty result means there is nothing left to
    /// process.
    async fn changed_rows(
        &self,
        kind: EntityKind,
        cursor: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, SourceError>;

    /// Fetch the next window of distinct film work ids linked to any of
    /// `ids` through `relation`.
    ///
    /// Results are ordered by film work id; `after` is the last id of the
    /// previous window, `None` for the first one.
    async fn related_filmwork_ids(
        &self,
        relation: JoinRelation,
        ids: &[Uuid],
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Uuid>, SourceError>;

    /// Fetch one aggregated row per film work id.
    ///
    /// Ids that do not exist in the source are absent from the result.
    async fn aggregate_filmworks(&self, ids: &[Uuid]) -> Result<Vec<AggregateRow>, SourceError>;

    /// Check that the source answers a trivial query.
    async fn health_check(&self) -> Result<bool, SourceError>;
}
