//! Run summary
//!
//! Lookup performance of one pass, rendered as the plain-text
//! `NS_performance_summary.txt` curators read alongside the triage files.

use super::resolution_engine::ResolutionReport;
use microkg_common::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE_NAME: &str = "NS_performance_summary.txt";

/// Tier counts of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerformanceSummary {
    pub total: usize,
    pub id_success: usize,
    pub id_fails: usize,
    pub name_success: usize,
    pub final_fails: usize,
    pub errors: usize,
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl PerformanceSummary {
    pub fn from_report(report: &ResolutionReport) -> Self {
        Self {
            total: report.total,
            id_success: report.resolved_by_id,
            id_fails: report.id_misses,
            name_success: report.resolved_by_name,
            final_fails: report.failed_both,
            errors: report.errors(),
        }
    }

    pub fn total_success(&self) -> usize {
        self.id_success + self.name_success
    }

    /// Plain-text report
    pub fn render(&self) -> String {
        let t = self.total;
        format!(
            "Node Synonymization Performance Analysis:\n\
             1. Total Rows: {t}\n\
             \n2. Step 1 (ID Lookup):\n\
             \x20  * Successful: {id_ok} ({id_ok_pct:.2}%)\n\
             \x20  * Failed: {id_fail} ({id_fail_pct:.2}%)\n\
             \n3. Step 2 (Name Lookup for Step 1 Fails):\n\
             \x20  * Total attempted lookups: {id_fail}\n\
             \x20  * Successful: {name_ok}\n\
             \x20  * Failed: {final_fail} ({final_fail_pct:.2}%)\n\
             \nSummary:\n\
             * ID Lookup Success: {id_ok}\n\
             * Name Lookup Success: {name_ok}\n\
             * Total Success: {total_ok} ({total_ok_pct:.2}%)\n\
             * Final Failures: {final_fail} ({final_fail_pct:.2}%)\n\
             * Errors: {errors} ({errors_pct:.2}%)\n",
            id_ok = self.id_success,
            id_ok_pct = percent(self.id_success, t),
            id_fail = self.id_fails,
            id_fail_pct = percent(self.id_fails, t),
            name_ok = self.name_success,
            final_fail = self.final_fails,
            final_fail_pct = percent(self.final_fails, t),
            total_ok = self.total_success(),
            total_ok_pct = percent(self.total_success(), t),
            errors = self.errors,
            errors_pct = percent(self.errors, t),
        )
    }

    /// Write the report into `dir`, returning the file path
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(SUMMARY_FILE_NAME);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}
