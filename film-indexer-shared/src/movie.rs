//! Movie document types.
//!
//! `Movie` is the document stored in the search index. Collections are
//! `None` rather than empty when the film work has no related entity of that
//! kind, which serializes to JSON `null`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Person value object embedded in a movie document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    /// Lower-cased full name.
    pub full_name: String,
}

/// Participation role of a person in a film work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Actor,
    Writer,
    Director,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Actor, Role::Writer, Role::Director];

    /// Career name stored in the source database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Actor => "actor",
            Role::Writer => "writer",
            Role::Director => "director",
        }
    }
}

/// A film work as indexed in the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub actors_names: Option<Vec<String>>,
    pub writers_names: Option<Vec<String>>,
    pub directors_names: Option<Vec<String>>,
    pub actors: Option<Vec<Person>>,
    pub writers: Option<Vec<Person>>,
    pub directors: Option<Vec<Person>>,
}

impl Movie {
    /// Document identifier used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}
