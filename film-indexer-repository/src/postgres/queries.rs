//! SQL builders for the source queries.
//!
//! Table and column names come from the closed `EntityKind`/`JoinRelation`
//! sets and are interpolated; every value is bound as a parameter.

use film_indexer_shared::{EntityKind, JoinRelation, Role};

/// Changed rows of a kind at or after a watermark (`$1`), limited by `$2`.
pub fn changed_since(kind: EntityKind) -> String {
    format!(
        "SELECT id, updated_at FROM content.{table} \
         WHERE updated_at >= $1 \
         ORDER BY updated_at, id \
         LIMIT $2",
        table = kind.as_str()
    )
}

/// Changed rows of a kind strictly after `($1, $2)`, limited by `$3`.
pub fn changed_after(kind: EntityKind) -> String {
    format!(
        "SELECT id, updated_at FROM content.{table} \
         WHERE (updated_at, id) > ($1, $2) \
         ORDER BY updated_at, id \
         LIMIT $3",
        table = kind.as_str()
    )
}

/// Distinct film work ids linked to any id of `$1`.
///
/// With `keyset`, results continue after film work id `$2` and the limit is
/// `$3`; otherwise the limit is `$2`.
pub fn related_filmwork_ids(relation: JoinRelation, keyset: bool) -> String {
    if keyset {
        format!(
            "SELECT DISTINCT filmwork_id FROM content.{table} \
             WHERE {column} = ANY($1) AND filmwork_id > $2 \
             ORDER BY filmwork_id \
             LIMIT $3",
            table = relation.table,
            column = relation.column
        )
    } else {
        format!(
            "SELECT DISTINCT filmwork_id FROM content.{table} \
             WHERE {column} = ANY($1) \
             ORDER BY filmwork_id \
             LIMIT $2",
            table = relation.table,
            column = relation.column
        )
    }
}

fn persons_by_role(role: Role) -> String {
    format!(
        "COALESCE(\
            jsonb_agg(DISTINCT jsonb_build_object('id', p.id, 'full_name', p.full_name)) \
            FILTER (WHERE c.name = '{career}'), \
            '[]'::jsonb) AS {column}",
        career = role.as_str(),
        column = role_column(role)
    )
}

/// Column alias holding the person list of a role.
pub fn role_column(role: Role) -> &'static str {
    match role {
        Role::Actor => "actors",
        Role::Writer => "writers",
        Role::Director => "directors",
    }
}

/// One denormalized row per film work id of `$1`.
pub fn aggregate_filmworks() -> String {
    let persons: Vec<String> = Role::ALL.iter().map(|role| persons_by_role(*role)).collect();

    format!(
        "SELECT fw.id, fw.title, fw.description, fw.rating::float8 AS rating, \
            COALESCE(array_agg(DISTINCT g.name) FILTER (WHERE g.name IS NOT NULL), '{{}}'::text[]) AS genres, \
            {persons} \
         FROM content.filmwork fw \
         LEFT JOIN content.genres_filmworks gfw ON gfw.filmwork_id = fw.id \
         LEFT JOIN content.genre g ON g.id = gfw.genre_id \
         LEFT JOIN content.persons_filmworks pfw ON pfw.filmwork_id = fw.id \
         LEFT JOIN content.person p ON p.id = pfw.person_id \
         LEFT JOIN content.career c ON c.id = pfw.role_id \
         WHERE fw.id = ANY($1) \
         GROUP BY fw.id",
        persons = persons.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_queries_target_kind_table() {
        let since = changed_since(EntityKind::Person);
        assert!(since.contains("FROM content.person "));
        assert!(since.contains("updated_at >= $1"));
        assert!(since.contains("ORDER BY updated_at, id"));

        let after = changed_after(EntityKind::Filmwork);
        assert!(after.contains("FROM content.filmwork "));
        assert!(after.contains("(updated_at, id) > ($1, $2)"));
        assert!(after.contains("LIMIT $3"));
    }

    #[test]
    fn test_related_query_uses_relation() {
        let relation = EntityKind::Genre.join_relation().unwrap();

        let first = related_filmwork_ids(relation, false);
        assert!(first.contains("FROM content.genres_filmworks"));
        assert!(first.contains("genre_id = ANY($1)"));
        assert!(first.contains("LIMIT $2"));

        let next = related_filmwork_ids(relation, true);
        assert!(next.contains("filmwork_id > $2"));
        assert!(next.contains("LIMIT $3"));
    }

    #[test]
    fn test_aggregate_query_filters_every_role() {
        let sql = aggregate_filmworks();
        for role in Role::ALL {
            assert!(sql.contains(&format!("c.name = '{}'", role.as_str())));
            assert!(sql.contains(&format!("AS {}", role_column(role))));
        }
        assert!(sql.contains("'{}'::text[]"));
        assert!(sql.contains("GROUP BY fw.id"));
    }
}
