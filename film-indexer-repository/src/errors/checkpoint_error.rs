//! Checkpoint store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing checkpoints.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Reading or writing the state file failed.
    #[error("Checkpoint IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but does not hold a JSON object of strings.
    #[error("Corrupted checkpoint file {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

impl CheckpointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupted(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
