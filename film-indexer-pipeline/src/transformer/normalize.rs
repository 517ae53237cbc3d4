//! Normalization rules for related collections.
//!
//! An empty collection normalizes to `None` so the document field is absent
//! rather than an empty list.

use std::collections::HashSet;

use film_indexer_shared::{Person, PersonRef};

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Lower-cased genre names, first occurrence wins.
pub fn normalize_genres(names: &[String]) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    non_empty(
        names
            .iter()
            .map(|name| name.to_lowercase())
            .filter(|name| seen.insert(name.clone()))
            .collect(),
    )
}

/// Lower-cased full names, in source order.
pub fn person_names(persons: &[PersonRef]) -> Option<Vec<String>> {
    non_empty(persons.iter().map(|p| p.full_name.to_lowercase()).collect())
}

/// Person objects with lower-cased full names, in source order.
pub fn persons(persons: &[PersonRef]) -> Option<Vec<Person>> {
    non_empty(
        persons
            .iter()
            .map(|p| Person {
                id: p.id,
                full_name: p.full_name.to_lowercase(),
            })
            .collect(),
    )
}

/// Rating as a nullable float. Zero counts as missing.
pub fn rating(value: Option<f64>) -> Option<f64> {
    value.filter(|r| *r != 0.0 && !r.is_nan())
}
