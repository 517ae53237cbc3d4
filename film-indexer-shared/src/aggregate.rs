//! Aggregated source rows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person linked to a film work, as returned by the aggregation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub full_name: String,
}

impl PersonRef {
    pub fn new(id: Uuid, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
        }
    }
}

/// One denormalized row per film work.
///
/// Related collections are already de-duplicated and filtered by role. A
/// film work without genres or persons carries empty lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
    pub directors: Vec<PersonRef>,
}

impl AggregateRow {
    /// Create a row with no related entities.
    pub fn new(id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }
}
