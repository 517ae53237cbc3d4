//! Movie transformer implementation.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::PipelineError;
use crate::stage::Sink;
use crate::transformer::normalize;
use film_indexer_shared::{AggregateRow, Movie};

/// Map one aggregated row to a movie document.
///
/// Each role is projected twice from the same source list: once as plain
/// names and once as person objects.
pub fn to_movie(row: AggregateRow) -> Movie {
    Movie {
        id: row.id,
        title: row.title,
        description: row.description,
        rating: normalize::rating(row.rating),
        genres: normalize::normalize_genres(&row.genres),
        actors_names: normalize::person_names(&row.actors),
        writers_names: normalize::person_names(&row.writers),
        directors_names: normalize::person_names(&row.directors),
        actors: normalize::persons(&row.actors),
        writers: normalize::persons(&row.writers),
        directors: normalize::persons(&row.directors),
    }
}

/// Transformer stage that turns aggregated rows into movie documents.
pub struct MovieTransformer {
    downstream: Box<dyn Sink<Vec<Movie>>>,
}

impl MovieTransformer {
    pub fn new(downstream: Box<dyn Sink<Vec<Movie>>>) -> Self {
        Self { downstream }
    }
}

#[async_trait]
impl Sink<Vec<AggregateRow>> for MovieTransformer {
    #[instrument(skip(self, rows), fields(row_count = rows.len()))]
    async fn submit(&mut self, rows: Vec<AggregateRow>) -> Result<(), PipelineError> {
        if rows.is_empty() {
            return Ok(());
        }

        let movies: Vec<Movie> = rows.into_iter().map(to_movie).collect();
        debug!(count = movies.len(), "Transformed rows");
        self.downstream.submit(movies).await
    }
}
