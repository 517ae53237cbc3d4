//! Source database error types.

use thiserror::Error;

use super::Transient;

/// Errors that can occur while querying the source database.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The database could not be reached or the connection dropped.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The database rejected the query.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A returned row did not have the expected shape.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}

/// SQLSTATE codes the server reports when the connection or the server
/// itself is the problem rather than the statement.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || matches!(
            code,
            "57P01" | "57P02" | "57P03" | "57014" | "53300" | "40001" | "40P01"
        )
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db)
                if db.code().is_some_and(|code| is_transient_sqlstate(&code)) =>
            {
                Self::ConnectionError(err.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Protocol(_) => Self::ConnectionError(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::DecodeError(err.to_string()),
            other => Self::QueryError(other.to_string()),
        }
    }
}

impl Transient for SourceError {
    fn is_transient(&self) -> bool {
        matches!(self, SourceError::ConnectionError(_))
    }
}
