//! Postgres implementation of the source repository.
//!
//! This module provides a concrete implementation of `SourceRepository`
//! using `sqlx` against the `content` schema.

mod client;
mod queries;

pub use client::PostgresSource;
