//! Synonym database access
//!
//! The node synonymizer database is opened read-only; this tool never writes
//! to it.

pub mod synonyms;

use microkg_common::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

/// Tables the synonym lookups depend on
pub const REQUIRED_TABLES: [&str; 2] = ["nodes", "clusters"];

/// Open the synonym database read-only and verify its layout
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Synonym database not found: {}",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);

    // Lookups are issued one at a time
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    verify_schema(&pool).await?;
    tracing::debug!(path = %db_path.display(), "Synonym database opened read-only");

    Ok(pool)
}

/// Check that the synonymizer tables exist
pub async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    let tables: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    let missing: Vec<&str> = REQUIRED_TABLES
        .iter()
        .copied()
        .filter(|t| !tables.iter().any(|(name,)| name == t))
        .collect();

    if !missing.is_empty() {
        return Err(Error::Schema(format!(
            "Synonym database is missing tables: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}
