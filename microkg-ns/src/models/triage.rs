//! Triage partitions of a finished batch

use super::record::{Batch, Record, Tier};

/// Lightweight audit row for a triage partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageRow {
    /// Position of the record in its batch
    pub index: usize,
    pub id: String,
    pub name: String,
    pub category: String,
    /// Fault message (errored partition only)
    pub error: Option<String>,
}

impl TriageRow {
    fn from_record(index: usize, record: &Record) -> Self {
        Self {
            index,
            id: record.raw_id.clone(),
            name: record.raw_name.clone(),
            category: record.category.clone(),
            error: record.fault.clone(),
        }
    }
}

/// Per-outcome partitions of a batch
///
/// `succeeded`, `failed_both` and `errored` are disjoint and together cover the
/// batch. `failed_id_only` is the audit view of every record whose tier-1
/// identifier lookup missed, whatever happened at tier 2.
///
/// `failed_id_only` overlaps `succeeded` and `failed_both`, so adding up all
/// four partition files double-counts; [`TriageSet::outcome_total`] is the
/// coverage check and always equals the batch size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageSet {
    pub succeeded: Vec<TriageRow>,
    pub failed_id_only: Vec<TriageRow>,
    pub failed_both: Vec<TriageRow>,
    pub errored: Vec<TriageRow>,
}

impl TriageSet {
    /// Partition a finished batch
    pub fn from_batch(batch: &Batch) -> Self {
        let mut set = TriageSet::default();

        for (index, record) in batch.iter().enumerate() {
            let row = TriageRow::from_record(index, record);

            if record.id_missed {
                set.failed_id_only.push(row.clone());
            }

            match record.tier {
                Tier::ResolvedById | Tier::ResolvedByName => set.succeeded.push(row),
                Tier::FailedBoth => set.failed_both.push(row),
                Tier::Error => set.errored.push(row),
                Tier::Unresolved => {
                    tracing::warn!(index, id = %record.raw_id, "Unresolved record left out of triage");
                }
            }
        }

        set
    }

    /// Number of rows across the disjoint outcome partitions
    pub fn outcome_total(&self) -> usize {
        self.succeeded.len() + self.failed_both.len() + self.errored.len()
    }
}
