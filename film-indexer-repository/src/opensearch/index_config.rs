//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the movies index.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::errors::SearchError;

/// The default name of the search index.
pub const DEFAULT_INDEX_NAME: &str = "movies";

/// Target index name together with the schema used to create it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub name: String,
    pub schema: Value,
}

impl IndexConfig {
    /// Index `name` with the built-in movies mapping.
    pub fn movies(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: movies_index_settings(),
        }
    }

    /// Index `name` with a schema read from a JSON file.
    pub fn from_schema_file(name: impl Into<String>, path: &Path) -> Result<Self, SearchError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SearchError::parse(format!("{}: {}", path.display(), e)))?;
        let schema = serde_json::from_str(&raw)
            .map_err(|e| SearchError::parse(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            name: name.into(),
            schema,
        })
    }
}

fn person_mapping() -> Value {
    json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": {"type": "keyword"},
            "full_name": {"type": "text", "analyzer": "movies_analyzer"}
        }
    })
}

/// Get the index settings and mappings for the movies index.
///
/// - `genres` and ids are keywords for exact filtering
/// - names and free text use a lower-casing English analyzer
/// - the per-role person lists are `nested` so id and name stay paired
pub fn movies_index_settings() -> Value {
    json!({
        "settings": {
            "refresh_interval": "1s",
            "analysis": {
                "filter": {
                    "english_stop": {"type": "stop", "stopwords": "_english_"},
                    "english_stemmer": {"type": "stemmer", "language": "english"},
                    "english_possessive_stemmer": {"type": "stemmer", "language": "possessive_english"}
                },
                "analyzer": {
                    "movies_analyzer": {
                        "tokenizer": "standard",
                        "filter": [
                            "lowercase",
                            "english_stop",
                            "english_stemmer",
                            "english_possessive_stemmer"
                        ]
                    }
                }
            }
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": {"type": "keyword"},
                "rating": {"type": "float"},
                "genres": {"type": "keyword"},
                "title": {
                    "type": "text",
                    "analyzer": "movies_analyzer",
                    "fields": {"raw": {"type": "keyword"}}
                },
                "description": {"type": "text", "analyzer": "movies_analyzer"},
                "actors_names": {"type": "text", "analyzer": "movies_analyzer"},
                "writers_names": {"type": "text", "analyzer": "movies_analyzer"},
                "directors_names": {"type": "text", "analyzer": "movies_analyzer"},
                "actors": person_mapping(),
                "writers": person_mapping(),
                "directors": person_mapping()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = movies_index_settings();
        let properties = &settings["mappings"]["properties"];

        assert_eq!(properties["id"]["type"], "keyword");
        assert_eq!(properties["rating"]["type"], "float");
        assert_eq!(properties["genres"]["type"], "keyword");
        assert_eq!(properties["title"]["fields"]["raw"]["type"], "keyword");

        for role in ["actors", "writers", "directors"] {
            assert_eq!(properties[role]["type"], "nested");
            assert_eq!(properties[role]["properties"]["id"]["type"], "keyword");
            assert_eq!(properties[format!("{}_names", role)]["type"], "text");
        }

        assert!(settings["settings"]["analysis"]["analyzer"]["movies_analyzer"].is_object());
    }

    #[test]
    fn test_movies_config_uses_default_mapping() {
        let config = IndexConfig::movies(DEFAULT_INDEX_NAME);
        assert_eq!(config.name, "movies");
        assert_eq!(config.schema, movies_index_settings());
    }

    #[test]
    fn test_schema_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        fs::write(&path, r#"{"mappings": {"properties": {"id": {"type": "keyword"}}}}"#).unwrap();

        let config = IndexConfig::from_schema_file("films", &path).unwrap();

        assert_eq!(config.name, "films");
        assert_eq!(config.schema["mappings"]["properties"]["id"]["type"], "keyword");
    }

    #[test]
    fn test_missing_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexConfig::from_schema_file("films", &dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, SearchError::ParseError(_)));
    }
}
