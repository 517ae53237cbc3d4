//! Entity kinds tracked by the indexer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Source table kinds that can trigger re-indexing.
///
/// `Filmwork` is the root kind: its ids are the documents written to the
/// search index. `Person` and `Genre` are secondary kinds whose changes are
/// traced back to the film works that reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Filmwork,
    Person,
    Genre,
}

/// Many-to-many table linking a secondary kind to film works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRelation {
    /// Join table name inside the `content` schema.
    pub table: &'static str,
    /// Column holding the secondary entity id.
    pub column: &'static str,
}

/// Error returned when parsing an unknown entity kind name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

impl EntityKind {
    /// Every kind, in the order a sync cycle processes them.
    pub const ALL: [EntityKind; 3] = [EntityKind::Filmwork, EntityKind::Person, EntityKind::Genre];

    /// Table name inside the `content` schema; also the checkpoint key.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Filmwork => "filmwork",
            EntityKind::Person => "person",
            EntityKind::Genre => "genre",
        }
    }

    /// Join relation used to resolve film works for a secondary kind.
    ///
    /// Returns `None` for the root kind.
    pub fn join_relation(&self) -> Option<JoinRelation> {
        match self {
            EntityKind::Filmwork => None,
            EntityKind::Person => Some(JoinRelation {
                table: "persons_filmworks",
                column: "person_id",
            }),
            EntityKind::Genre => Some(JoinRelation {
                table: "genres_filmworks",
                column: "genre_id",
            }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filmwork" => Ok(EntityKind::Filmwork),
            "person" => Ok(EntityKind::Person),
            "genre" => Ok(EntityKind::Genre),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "career".parse::<EntityKind>().unwrap_err();
        assert_eq!(err, UnknownEntityKind("career".to_string()));
    }

    #[test]
    fn test_only_secondary_kinds_have_relations() {
        assert!(EntityKind::Filmwork.join_relation().is_none());

        let person = EntityKind::Person.join_relation().unwrap();
        assert_eq!(person.table, "persons_filmworks");
        assert_eq!(person.column, "person_id");

        let genre = EntityKind::Genre.join_relation().unwrap();
        assert_eq!(genre.table, "genres_filmworks");
        assert_eq!(genre.column, "genre_id");
    }
}
