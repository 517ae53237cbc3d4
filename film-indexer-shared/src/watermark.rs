//! Checkpoint watermark.
//!
//! A watermark is the `updated_at` boundary below which every source row is
//! assumed to be indexed already. It is stored and compared as a string; the
//! fixed-width UTC format keeps string order equal to time order.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format used for every watermark written by the indexer.
const WATERMARK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Error returned when a stored watermark cannot be read back as a timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid watermark {value:?}: {reason}")]
pub struct WatermarkError {
    pub value: String,
    pub reason: String,
}

/// Sortable `updated_at` boundary for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(String);

impl Watermark {
    /// The "beginning of time" sentinel, earlier than any real row.
    pub fn epoch() -> Self {
        let epoch = NaiveDate::from_ymd_opt(1700, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::from_timestamp(epoch)
    }

    /// Build a watermark from a timestamp.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self(ts.format(WATERMARK_FORMAT).to_string())
    }

    /// Wrap a persisted value without validating it.
    ///
    /// Validation happens lazily in [`Watermark::to_timestamp`], when the
    /// value is bound into a query.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse the watermark back into a timestamp.
    pub fn to_timestamp(&self) -> Result<DateTime<Utc>, WatermarkError> {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| WatermarkError {
                value: self.0.clone(),
                reason: e.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::from_timestamp(ts)
    }
}
