//! Two-stage synonymization workflow
//!
//! First pass: load → resolve (id, then name) → triage files + summary.
//! Retry pass: the `FAILED_BOTH`/`ERROR` subset (in memory, or re-ingested
//! from `failed_both.csv`) → normalize → augment gene names → resolve → triage.
//!
//! The retry is a single explicit second stage, not a loop to a fixpoint.

use crate::models::{Batch, TriageSet};
use crate::services::gene_augmenter::{AugmentationStats, GeneAugmenter, GeneDescriptionSource};
use crate::services::lookup_client::CanonicalLookup;
use crate::services::name_normalizer::{normalize_batch, NormalizeStats};
use crate::services::resolution_engine::{ResolutionEngine, ResolutionReport};
use crate::services::statistics::PerformanceSummary;
use crate::services::triage_writer::{TriageLayout, TriageWriter};
use crate::tabular::{load_batch, write_table, Delimiter};
use microkg_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Column holding the rewritten identifier in a prepared table
pub const PREPARED_ID_COLUMN: &str = "ID";
/// Column holding the rewritten name in a prepared table
pub const PREPARED_NAME_COLUMN: &str = "Name";

/// Stem of the annotated retry output (`<stem>_processed.tsv`)
pub const RETRY_BASE_NAME: &str = "failed_both_syn";
/// Directory receiving retry triage files
pub const RETRY_FAILURE_DIR: &str = "failure_logs";
/// Subdirectory of the stat dir used by an in-memory retry
pub const RETRY_SUBDIR: &str = "retry";

/// Result of one resolution pass
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub batch: Batch,
    pub report: ResolutionReport,
    pub triage: TriageSet,
    pub summary: PerformanceSummary,
    pub summary_path: PathBuf,
}

/// Rewrites made while preparing a batch for the retry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareStats {
    pub normalized: NormalizeStats,
    /// `None` when augmentation was disabled
    pub augmentation: Option<AugmentationStats>,
}

/// Everything a `resolve` run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub first: PassOutcome,
    pub prepare: Option<PrepareStats>,
    pub retry: Option<PassOutcome>,
}

/// Layout of an in-memory or file-driven retry rooted at `dir`
pub fn retry_layout(dir: &Path) -> TriageLayout {
    TriageLayout {
        annotated_path: dir.join(format!("{}_processed.tsv", RETRY_BASE_NAME)),
        triage_dir: dir.join(RETRY_FAILURE_DIR),
        suffix: "2".to_string(),
    }
}

/// Whether a batch already carries the prepared `ID`/`Name` columns
pub fn is_prepared(batch: &Batch) -> bool {
    batch.header.iter().any(|h| h == PREPARED_ID_COLUMN)
        && batch.header.iter().any(|h| h == PREPARED_NAME_COLUMN)
}

fn ensure_column(header: &mut Vec<String>, name: &str) -> usize {
    match header.iter().position(|h| h == name) {
        Some(i) => i,
        None => {
            header.push(name.to_string());
            header.len() - 1
        }
    }
}

/// Mirror each record's lookup id/name into the `ID`/`Name` columns
pub fn add_prepared_columns(batch: &mut Batch) {
    let id_col = ensure_column(&mut batch.header, PREPARED_ID_COLUMN);
    let name_col = ensure_column(&mut batch.header, PREPARED_NAME_COLUMN);
    let width = batch.header.len();

    for record in &mut batch.records {
        record.row.resize(width, String::new());
        record.row[id_col] = record.raw_id.clone();
        record.row[name_col] = record.raw_name.clone();
    }
}

/// Normalize a batch, augment its gene names, and fill the `ID`/`Name` columns
///
/// `describer` is `None` when augmentation is disabled.
pub async fn prepare_batch(
    batch: &mut Batch,
    describer: Option<&dyn GeneDescriptionSource>,
) -> PrepareStats {
    let normalized = normalize_batch(batch);
    info!(
        ids_remapped = normalized.ids_remapped,
        names_truncated = normalized.names_truncated,
        "Normalized retry batch"
    );

    let augmentation = match describer {
        Some(source) => Some(GeneAugmenter::new(source).augment_batch(batch).await),
        None => {
            info!("Gene augmentation disabled");
            None
        }
    };

    add_prepared_columns(batch);

    PrepareStats {
        normalized,
        augmentation,
    }
}

/// Prepare a failed-records file and write the prepared table as TSV
pub async fn run_prepare(
    input: &Path,
    output: &Path,
    describer: Option<&dyn GeneDescriptionSource>,
) -> Result<PrepareStats> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("prepare", %run_id);

    async move {
        let mut batch = load_batch(input)?;
        let stats = prepare_batch(&mut batch, describer).await;

        let rows: Vec<&[String]> = batch.records.iter().map(|r| r.row.as_slice()).collect();
        write_table(output, Delimiter::Tab, &batch.header, &rows)?;
        info!("Cleaned data saved to {}", output.display());

        Ok(stats)
    }
    .instrument(span)
    .await
}

/// Drives the stages over the synonym authority and description service
pub struct Pipeline<'a> {
    lookup: &'a dyn CanonicalLookup,
    describer: Option<&'a dyn GeneDescriptionSource>,
}

impl<'a> Pipeline<'a> {
    /// `describer` is `None` when augmentation is disabled
    pub fn new(
        lookup: &'a dyn CanonicalLookup,
        describer: Option<&'a dyn GeneDescriptionSource>,
    ) -> Self {
        Self { lookup, describer }
    }

    /// Normalize identifiers/names and augment gene names ahead of a retry
    pub async fn prepare(&self, batch: &mut Batch) -> PrepareStats {
        prepare_batch(batch, self.describer).await
    }

    /// Resolve a batch and write its annotated table, triage files and summary
    pub async fn resolve_pass(
        &self,
        mut batch: Batch,
        layout: TriageLayout,
        stat_dir: &Path,
    ) -> Result<PassOutcome> {
        let engine = ResolutionEngine::new(self.lookup);
        let report = engine.resolve_batch(&mut batch).await;

        let triage = TriageWriter::new(layout).write(&batch)?;

        let summary = PerformanceSummary::from_report(&report);
        let summary_path = summary.write(stat_dir)?;
        info!("Performance summary saved to: {}\n{}", summary_path.display(), summary.render());

        if report.errors() > 0 {
            warn!("Errors encountered in {} records. Check errors file for details.", report.errors());
        }

        Ok(PassOutcome {
            batch,
            report,
            triage,
            summary,
            summary_path,
        })
    }

    /// First pass over `input`, optionally followed by an in-memory retry
    ///
    /// Partition files and the summary go to `stat_dir`; retry outputs go to
    /// `stat_dir/retry`.
    pub async fn run_resolve(
        &self,
        input: &Path,
        output: &Path,
        stat_dir: &Path,
        retry: bool,
    ) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("resolve", %run_id);

        async move {
            info!("Loading input data...");
            let batch = load_batch(input)?;

            info!("Processing synonyms...");
            let layout = TriageLayout {
                annotated_path: output.to_path_buf(),
                triage_dir: stat_dir.to_path_buf(),
                suffix: String::new(),
            };
            let first = self.resolve_pass(batch, layout, stat_dir).await?;

            let (prepare, retry_outcome) = if retry {
                let mut retry_batch = first.batch.retry_subset();
                if retry_batch.is_empty() {
                    info!("No failed records, skipping retry pass");
                    (None, None)
                } else {
                    info!(records = retry_batch.len(), "Starting retry pass");
                    let prepare = self.prepare(&mut retry_batch).await;
                    let retry_dir = stat_dir.join(RETRY_SUBDIR);
                    let outcome = self
                        .resolve_pass(retry_batch, retry_layout(&retry_dir), &retry_dir)
                        .await?;
                    (Some(prepare), Some(outcome))
                }
            } else {
                (None, None)
            };

            info!("Processing complete!");
            Ok(RunSummary {
                run_id,
                first,
                prepare,
                retry: retry_outcome,
            })
        }
        .instrument(span)
        .await
    }

    /// Second pass over a failed or prepared file, writing into `output_dir`
    ///
    /// A file that already has `ID`/`Name` columns is resolved as is; anything
    /// else is prepared first.
    pub async fn run_retry(&self, input: &Path, output_dir: &Path) -> Result<(Option<PrepareStats>, PassOutcome)> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("retry", %run_id);

        async move {
            let mut batch = load_batch(input)?;

            let prepare = if is_prepared(&batch) {
                info!("Input already prepared, resolving as is");
                None
            } else {
                Some(self.prepare(&mut batch).await)
            };

            let outcome = self
                .resolve_pass(batch, retry_layout(output_dir), output_dir)
                .await?;

            info!("Processing complete.");
            Ok((prepare, outcome))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_add_prepared_columns_appends_once() {
        let mut record = Record::new("EC:1.1.1.1", "adh", None);
        record.rewrite_id("KEGG.ENZYME:1.1.1.1".to_string());
        let mut batch = Batch::from_records(vec![record]);

        add_prepared_columns(&mut batch);
        add_prepared_columns(&mut batch);

        assert_eq!(batch.header, vec!["id", "name", "category", "ID", "Name"]);
        assert_eq!(
            batch.records[0].row,
            vec!["EC:1.1.1.1", "adh", "unknown", "KEGG.ENZYME:1.1.1.1", "adh"]
        );
        assert!(is_prepared(&batch));
    }

    #[test]
    fn test_retry_layout() {
        let layout = retry_layout(Path::new("/out"));
        assert_eq!(layout.annotated_path, PathBuf::from("/out/failed_both_syn_processed.tsv"));
        assert_eq!(layout.failed_both_path(), PathBuf::from("/out/failure_logs/failed_both2.csv"));
    }
}
