//! Triage writer
//!
//! Persists a finished batch: the annotated table (tab-separated, every input
//! column followed by `c_id`, `c_name`, `ns_status`) and one comma-separated
//! file per triage partition. Files are written one after another; a failure
//! stops the writer and earlier files stay on disk, since each one can be
//! rebuilt from the batch.

use crate::models::{Batch, TriageRow, TriageSet};
use crate::tabular::{write_table, Delimiter};
use microkg_common::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CANONICAL_ID_COLUMN: &str = "c_id";
pub const CANONICAL_NAME_COLUMN: &str = "c_name";
pub const STATUS_COLUMN: &str = "ns_status";

const TRIAGE_HEADER: [&str; 3] = ["id", "name", "category"];
const ERROR_HEADER: [&str; 5] = ["index", "id", "name", "category", "error"];

/// Where one pass writes its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageLayout {
    /// Annotated batch (TSV)
    pub annotated_path: PathBuf,
    /// Directory for the partition files
    pub triage_dir: PathBuf,
    /// Appended to partition file stems (`""` first pass, `"2"` retry)
    pub suffix: String,
}

impl TriageLayout {
    fn partition_path(&self, stem: &str) -> PathBuf {
        self.triage_dir.join(format!("{}{}.csv", stem, self.suffix))
    }

    pub fn succeeded_path(&self) -> PathBuf {
        self.partition_path("total_success")
    }

    pub fn failed_id_only_path(&self) -> PathBuf {
        self.partition_path("failed_curies")
    }

    pub fn failed_both_path(&self) -> PathBuf {
        self.partition_path("failed_both")
    }

    pub fn errored_path(&self) -> PathBuf {
        self.partition_path("errors")
    }
}

/// Header and rows of the annotated table
pub fn annotated_rows(batch: &Batch) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = batch.header.clone();
    header.push(CANONICAL_ID_COLUMN.to_string());
    header.push(CANONICAL_NAME_COLUMN.to_string());
    header.push(STATUS_COLUMN.to_string());

    let rows = batch
        .iter()
        .map(|record| {
            let mut row = record.row.clone();
            row.push(record.canonical_id.clone().unwrap_or_default());
            row.push(record.canonical_name.clone().unwrap_or_default());
            row.push(record.tier.as_str().to_string());
            row
        })
        .collect();

    (header, rows)
}

/// Write the annotated batch as TSV
pub fn write_annotated(path: &Path, batch: &Batch) -> Result<()> {
    let (header, rows) = annotated_rows(batch);
    write_table(path, Delimiter::Tab, &header, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "Annotated output saved");
    Ok(())
}

fn write_partition(path: &Path, rows: &[TriageRow]) -> Result<()> {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| vec![r.id.clone(), r.name.clone(), r.category.clone()])
        .collect();
    write_table(path, Delimiter::Comma, &TRIAGE_HEADER, &rows)
}

fn write_errors(path: &Path, rows: &[TriageRow]) -> Result<()> {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.index.to_string(),
                r.id.clone(),
                r.name.clone(),
                r.category.clone(),
                r.error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    write_table(path, Delimiter::Comma, &ERROR_HEADER, &rows)
}

/// Persists the outputs of one pass
pub struct TriageWriter {
    layout: TriageLayout,
}

impl TriageWriter {
    pub fn new(layout: TriageLayout) -> Self {
        Self { layout }
    }

    /// Write the annotated batch and every partition; returns the partitions
    pub fn write(&self, batch: &Batch) -> Result<TriageSet> {
        let set = TriageSet::from_batch(batch);

        write_annotated(&self.layout.annotated_path, batch)?;
        write_partition(&self.layout.failed_id_only_path(), &set.failed_id_only)?;
        write_partition(&self.layout.failed_both_path(), &set.failed_both)?;
        write_partition(&self.layout.succeeded_path(), &set.succeeded)?;
        write_errors(&self.layout.errored_path(), &set.errored)?;

        info!(
            dir = %self.layout.triage_dir.display(),
            succeeded = set.succeeded.len(),
            failed_id_only = set.failed_id_only.len(),
            failed_both = set.failed_both.len(),
            errored = set.errored.len(),
            "Triage files saved"
        );

        Ok(set)
    }
}
