//! Postgres source implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::SourceConfig;
use crate::errors::SourceError;
use crate::interfaces::SourceRepository;
use crate::postgres::queries;
use crate::types::{ChangeCursor, ChangedRow};
use film_indexer_shared::{AggregateRow, EntityKind, JoinRelation, PersonRef, Role};

/// Source repository reading the `content` schema of a Postgres database.
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    /// Connect to the database described by `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresSource)` - A connected source
    /// * `Err(SourceError)` - If the connection cannot be established
    pub async fn connect(config: &SourceConfig) -> Result<Self, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await?;

        info!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "Connected to Postgres source"
        );

        Ok(Self { pool })
    }

    fn limit(limit: usize) -> i64 {
        i64::try_from(limit).unwrap_or(i64::MAX)
    }

    fn decode_changed_row(row: &PgRow) -> Result<ChangedRow, SourceError> {
        Ok(ChangedRow {
            id: row.try_get("id")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn decode_persons(row: &PgRow, role: Role) -> Result<Vec<PersonRef>, SourceError> {
        let Json(persons): Json<Vec<PersonRef>> = row.try_get(queries::role_column(role))?;
        Ok(persons)
    }

    fn decode_aggregate_row(row: &PgRow) -> Result<AggregateRow, SourceError> {
        Ok(AggregateRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            rating: row.try_get("rating")?,
            genres: row.try_get("genres")?,
            actors: Self::decode_persons(row, Role::Actor)?,
            writers: Self::decode_persons(row, Role::Writer)?,
            directors: Self::decode_persons(row, Role::Director)?,
        })
    }
}

#[async_trait]
impl SourceRepository for PostgresSource {
    #[instrument(skip(self, cursor))]
    async fn changed_rows(
        &self,
        kind: EntityKind,
        cursor: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, SourceError> {
        let rows = match cursor {
            ChangeCursor::Since(watermark) => {
                let since: DateTime<Utc> = watermark
                    .to_timestamp()
                    .map_err(|e| SourceError::query(e.to_string()))?;
                sqlx::query(&queries::changed_since(kind))
                    .bind(since)
                    .bind(Self::limit(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            ChangeCursor::After { updated_at, id } => {
                sqlx::query(&queries::changed_after(kind))
                    .bind(*updated_at)
                    .bind(*id)
                    .bind(Self::limit(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = rows.len(), "Fetched changed rows");
        rows.iter().map(Self::decode_changed_row).collect()
    }

    #[instrument(skip(self, relation, ids), fields(table = relation.table, id_count = ids.len()))]
    async fn related_filmwork_ids(
        &self,
        relation: JoinRelation,
        ids: &[Uuid],
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Uuid>, SourceError> {
        let rows = match after {
            None => {
                sqlx::query(&queries::related_filmwork_ids(relation, false))
                    .bind(ids)
                    .bind(Self::limit(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(last) => {
                sqlx::query(&queries::related_filmwork_ids(relation, true))
                    .bind(ids)
                    .bind(last)
                    .bind(Self::limit(limit))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = rows.len(), "Fetched related film work ids");
        rows.iter()
            .map(|row| row.try_get::<Uuid, _>("filmwork_id").map_err(SourceError::from))
            .collect()
    }

    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    async fn aggregate_filmworks(&self, ids: &[Uuid]) -> Result<Vec<AggregateRow>, SourceError> {
        let rows = sqlx::query(&queries::aggregate_filmworks())
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Fetched aggregated film works");
        rows.iter().map(Self::decode_aggregate_row).collect()
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        let value: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(value == 1)
    }
}
