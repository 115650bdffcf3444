//! Canonical lookup client
//!
//! Contract wrapper around the synonym authority. Both lookups take a
//! non-empty key set and return entries only for the keys that matched: a
//! missing key is a miss, not an error. The client neither retries nor rate
//! limits; callers own that policy.

use crate::db::{self, synonyms};
use async_trait::async_trait;
use microkg_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Preferred identifier/name pair for one query key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub preferred_id: String,
    pub preferred_name: String,
}

impl LookupResult {
    pub fn new(preferred_id: impl Into<String>, preferred_name: impl Into<String>) -> Self {
        Self {
            preferred_id: preferred_id.into(),
            preferred_name: preferred_name.into(),
        }
    }
}

/// Synonym authority lookups
#[async_trait]
pub trait CanonicalLookup: Send + Sync {
    /// Resolve identifiers to their preferred identifier/name
    async fn lookup_by_id(&self, ids: &[String]) -> Result<HashMap<String, LookupResult>>;

    /// Resolve display names to their preferred identifier/name
    async fn lookup_by_name(&self, names: &[String]) -> Result<HashMap<String, LookupResult>>;
}

fn require_keys(keys: &[String], what: &str) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::InvalidInput(format!("{} lookup needs at least one key", what)));
    }
    Ok(())
}

/// Lookup client backed by the node synonymizer SQLite database
#[derive(Clone)]
pub struct SqliteSynonymizer {
    pool: SqlitePool,
}

impl SqliteSynonymizer {
    /// Open the synonym database at `path` (read-only)
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect_readonly(path).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CanonicalLookup for SqliteSynonymizer {
    async fn lookup_by_id(&self, ids: &[String]) -> Result<HashMap<String, LookupResult>> {
        require_keys(ids, "Identifier")?;

        let unique: Vec<String> = ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let rows = synonyms::find_by_ids(&self.pool, &unique).await?;

        let mut results = HashMap::new();
        for row in rows {
            // Rows arrive ordered by cluster id; the first hit per key wins
            results
                .entry(row.key)
                .or_insert_with(|| LookupResult::new(row.cluster_id, row.preferred_name));
        }

        debug!(requested = ids.len(), matched = results.len(), "Identifier lookup");
        Ok(results)
    }

    async fn lookup_by_name(&self, names: &[String]) -> Result<HashMap<String, LookupResult>> {
        require_keys(names, "Name")?;

        let mut by_simplified: HashMap<String, Vec<&String>> = HashMap::new();
        for name in names {
            by_simplified
                .entry(synonyms::simplify_name(name))
                .or_default()
                .push(name);
        }

        // Blank names never match anything
        by_simplified.remove("");
        if by_simplified.is_empty() {
            return Ok(HashMap::new());
        }

        let simplified: Vec<String> = by_simplified.keys().cloned().collect();
        let rows = synonyms::find_by_simplified_names(&self.pool, &simplified).await?;

        let mut results = HashMap::new();
        for row in rows {
            let Some(originals) = by_simplified.get(&row.key) else {
                continue;
            };
            for original in originals {
                results
                    .entry((*original).clone())
                    .or_insert_with(|| LookupResult::new(row.cluster_id.clone(), row.preferred_name.clone()));
            }
        }

        debug!(requested = names.len(), matched = results.len(), "Name lookup");
        Ok(results)
    }
}
