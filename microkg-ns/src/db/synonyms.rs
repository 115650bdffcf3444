//! Queries against the node synonymizer tables
//!
//! `nodes(id, cluster_id, name)` maps every known identifier to the cluster it
//! was merged into; `clusters(cluster_id, name, category)` carries the
//! preferred name of each cluster. The cluster id is the preferred identifier.

use microkg_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

/// Bound parameters per statement, well under SQLite's variable limit
const MAX_KEYS_PER_QUERY: usize = 500;

/// One matched node joined with its cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymRow {
    /// Matched value (`nodes.id`, or the simplified node name)
    pub key: String,
    pub cluster_id: String,
    pub preferred_name: String,
}

const SELECT_BY_ID: &str = "SELECT N.id, N.cluster_id, COALESCE(C.name, N.name, '') \
     FROM nodes AS N INNER JOIN clusters AS C ON C.cluster_id = N.cluster_id \
     WHERE N.id IN (";

/// Candidate filter on `N.name` lowercased with every ASCII whitespace
/// character removed; rows are then compared exactly with [`simplify_name`]
const SELECT_BY_NAME: &str = "SELECT N.name, N.cluster_id, COALESCE(C.name, N.name, '') \
     FROM nodes AS N INNER JOIN clusters AS C ON C.cluster_id = N.cluster_id \
     WHERE LOWER(REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(N.name, \
     ' ', ''), char(9), ''), char(10), ''), char(12), ''), char(13), '')) IN (";

/// Normal form used for name matching on both sides: ASCII-lowercased, with
/// ASCII whitespace trimmed and inner runs collapsed to one space
pub fn simplify_name(name: &str) -> String {
    name.split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// [`simplify_name`] with the spaces dropped, matching the SQL candidate filter
pub fn compact_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

async fn select_in(pool: &SqlitePool, prefix: &str, keys: &[String]) -> Result<Vec<SynonymRow>> {
    let mut rows = Vec::new();

    for chunk in keys.chunks(MAX_KEYS_PER_QUERY) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(prefix);
        let mut separated = builder.separated(", ");
        for key in chunk {
            separated.push_bind(key.as_str());
        }
        separated.push_unseparated(") ORDER BY N.cluster_id");

        let fetched: Vec<(String, String, String)> =
            builder.build_query_as().fetch_all(pool).await?;

        rows.extend(fetched.into_iter().map(|(key, cluster_id, preferred_name)| SynonymRow {
            key,
            cluster_id,
            preferred_name,
        }));
    }

    Ok(rows)
}

/// Nodes whose identifier equals one of `ids`, ordered by cluster id
pub async fn find_by_ids(pool: &SqlitePool, ids: &[String]) -> Result<Vec<SynonymRow>> {
    select_in(pool, SELECT_BY_ID, ids).await
}

/// Nodes whose simplified name equals one of `simplified_names`, ordered by cluster id
///
/// Each row's `key` is the simplified form of the stored node name.
pub async fn find_by_simplified_names(
    pool: &SqlitePool,
    simplified_names: &[String],
) -> Result<Vec<SynonymRow>> {
    let wanted: HashSet<&str> = simplified_names.iter().map(String::as_str).collect();
    let compact: Vec<String> = simplified_names
        .iter()
        .map(|n| compact_name(n))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let mut rows = select_in(pool, SELECT_BY_NAME, &compact).await?;

    // Chunks are each ordered; restore one global order before first-hit-wins
    rows.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    rows.retain_mut(|row| {
        row.key = simplify_name(&row.key);
        wanted.contains(row.key.as_str())
    });

    Ok(rows)
}
