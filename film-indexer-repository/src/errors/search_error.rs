//! Search error types.
//!
//! This module defines the error types that can occur during search engine operations.

use thiserror::Error;

use super::Transient;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to reach the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The search engine answered with a retryable status (429 or 5xx).
    #[error("Search engine unavailable ({status}): {body}")]
    UnavailableError { status: u16, body: String },

    /// The bulk request was rejected as a whole.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to delete the search index.
    #[error("Index deletion error: {0}")]
    IndexDeletionError(String),

    /// Failed to parse response from search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    ///
    /// 429 and 5xx become `UnavailableError`; anything else is handed to
    /// `otherwise`.
    pub fn from_status(status: u16, body: String, otherwise: fn(String) -> SearchError) -> Self {
        if status == 429 || status >= 500 {
            Self::UnavailableError { status, body }
        } else {
            otherwise(format!("status {}: {}", status, body))
        }
    }
}

impl Transient for SearchError {
    fn is_transient(&self) -> bool {
        match self {
            SearchError::ConnectionError(_) | SearchError::UnavailableError { .. } => true,
            SearchError::BulkIndexError(_)
            | SearchError::IndexCreationError(_)
            | SearchError::IndexDeletionError(_)
            | SearchError::ParseError(_)
            | SearchError::SerializationError(_) => false,
        }
    }
}
