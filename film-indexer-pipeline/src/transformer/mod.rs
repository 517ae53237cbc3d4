//! Transformer module for the film indexer pipeline.
//!
//! Maps aggregated source rows to the `Movie` documents stored in the index.

mod movie_transformer;
pub mod normalize;

pub use movie_transformer::{to_movie, MovieTransformer};
