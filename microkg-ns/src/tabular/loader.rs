//! Typed batch loader
//!
//! Validates required columns at ingestion so a malformed input fails before
//! any lookup is issued.

use super::{read_table, Table};
use crate::models::{Batch, Record};
use microkg_common::{Error, Result};
use std::path::Path;

/// Identifier column spellings, in priority order
///
/// Prepared retry files carry both the original `id` and the rewritten `ID`;
/// the rewritten value is the one to resolve.
const ID_COLUMNS: [&str; 2] = ["ID", "id"];
const NAME_COLUMNS: [&str; 2] = ["Name", "name"];
const CATEGORY_COLUMN: &str = "category";

fn find_column(table: &Table, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| table.column(c))
}

/// Build a batch from an already-read table
pub fn batch_from_table(table: Table) -> Result<Batch> {
    let id_col = find_column(&table, &ID_COLUMNS).ok_or_else(|| {
        Error::Schema(format!(
            "Missing identifier column (expected one of {:?}), found {:?}",
            ID_COLUMNS, table.header
        ))
    })?;
    let name_col = find_column(&table, &NAME_COLUMNS).ok_or_else(|| {
        Error::Schema(format!(
            "Missing name column (expected one of {:?}), found {:?}",
            NAME_COLUMNS, table.header
        ))
    })?;
    let category_col = table.column(CATEGORY_COLUMN);

    let records = table
        .rows
        .into_iter()
        .map(|row| {
            let raw_id = row[id_col].trim().to_string();
            let raw_name = row[name_col].trim().to_string();
            let category = category_col.map(|c| row[c].as_str());
            let mut record = Record::new(raw_id, raw_name, category);
            record.row = row;
            record
        })
        .collect();

    Ok(Batch::new(table.header, records))
}

/// Load an input file into a batch
pub fn load_batch(path: &Path) -> Result<Batch> {
    let table = read_table(path)?;
    let batch = batch_from_table(table)?;
    tracing::info!(path = %path.display(), records = batch.len(), "Loaded input batch");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_tsv_with_category() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "nodes.tsv",
            "id\tname\tcategory\tsource\nNCBITaxon:562\tEscherichia coli\tOrganismTaxon\tgut\n",
        );

        let batch = load_batch(&path).unwrap();
        assert_eq!(batch.header, vec!["id", "name", "category", "source"]);
        let record = &batch.records[0];
        assert_eq!(record.raw_id, "NCBITaxon:562");
        assert_eq!(record.raw_name, "Escherichia coli");
        assert_eq!(record.category, "OrganismTaxon");
        assert_eq!(record.row.len(), 4);
    }

    #[test]
    fn test_load_csv_without_category() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "failed_both.csv", "id,name\nNCBIGene:7157,7157\n");

        let batch = load_batch(&path).unwrap();
        assert_eq!(batch.records[0].category, "unknown");
    }

    #[test]
    fn test_upper_case_columns_take_priority() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "prepared.tsv",
            "id\tname\tcategory\tID\tName\nEC:1.1.1.1\tadh\tEnzyme\tKEGG.ENZYME:1.1.1.1\tadh\n",
        );

        let batch = load_batch(&path).unwrap();
        assert_eq!(batch.records[0].raw_id, "KEGG.ENZYME:1.1.1.1");
    }

    #[test]
    fn test_missing_name_column_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.tsv", "id\tlabel\nA:1\tx\n");

        match load_batch(&path) {
            Err(Error::Schema(msg)) => assert!(msg.contains("name column")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }
}
