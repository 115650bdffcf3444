//! Shared fixtures for microkg-ns integration tests

#![allow(dead_code)]

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// (node id, cluster id, node name)
pub type NodeRow<'a> = (&'a str, &'a str, &'a str);
/// (cluster id, preferred name, category)
pub type ClusterRow<'a> = (&'a str, &'a str, &'a str);

/// Create a synonym database with the given rows
///
/// Returns (TempDir, database path); the TempDir must outlive the test.
pub async fn create_synonym_db(nodes: &[NodeRow<'_>], clusters: &[ClusterRow<'_>]) -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("node_synonymizer.sqlite");

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;

    sqlx::query("CREATE TABLE clusters (cluster_id TEXT PRIMARY KEY, name TEXT, category TEXT)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE TABLE nodes (id TEXT PRIMARY KEY, cluster_id TEXT NOT NULL, name TEXT)")
        .execute(&pool)
        .await?;

    for (cluster_id, name, category) in clusters {
        sqlx::query("INSERT INTO clusters (cluster_id, name, category) VALUES (?, ?, ?)")
            .bind(cluster_id)
            .bind(name)
            .bind(category)
            .execute(&pool)
            .await?;
    }
    for (id, cluster_id, name) in nodes {
        sqlx::query("INSERT INTO nodes (id, cluster_id, name) VALUES (?, ?, ?)")
            .bind(id)
            .bind(cluster_id)
            .bind(name)
            .execute(&pool)
            .await?;
    }

    pool.close().await;
    Ok((temp_dir, db_path))
}

/// Database with a node table but no cluster table
pub async fn create_incomplete_db() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("broken.sqlite");

    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
    sqlx::query("CREATE TABLE nodes (id TEXT PRIMARY KEY, cluster_id TEXT, name TEXT)")
        .execute(&pool)
        .await?;
    pool.close().await;

    Ok((temp_dir, db_path))
}

/// Small synonymizer: A resolves by id, B only by name, C not at all
pub async fn create_abc_db() -> Result<(TempDir, PathBuf)> {
    create_synonym_db(
        &[
            ("A:1", "A:100", "alpha node"),
            ("B:9", "B:200", "Beta"),
            ("NCBIGene:7157", "NCBIGene:7157", "TP53"),
            ("KEGG.ENZYME:1.1.1.1", "KEGG.ENZYME:1.1.1.1", "alcohol dehydrogenase"),
        ],
        &[
            ("A:100", "Alpha", "biolink:Gene"),
            ("B:200", "Beta Preferred", "biolink:Protein"),
            ("NCBIGene:7157", "TP53", "biolink:Gene"),
            ("KEGG.ENZYME:1.1.1.1", "alcohol dehydrogenase", "biolink:MolecularActivity"),
        ],
    )
    .await
}

/// Write a text file and return its path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture file");
    path
}

/// Read a delimited file into rows of fields (no quoting in fixtures)
pub fn read_rows(path: &Path, delimiter: char) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .expect("read output file")
        .lines()
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}
