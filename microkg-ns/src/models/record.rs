//! Record and batch types
//!
//! A [`Record`] is one input row under resolution. The resolution engine is the
//! only component that changes a record's tier and canonical fields.

use std::fmt;

/// Category assigned when the input has no category column or an empty cell
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Resolution outcome of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Not yet processed
    Unresolved,
    /// Identifier lookup hit (tier 1)
    ResolvedById,
    /// Identifier lookup missed, name lookup hit (tier 2)
    ResolvedByName,
    /// Both lookups missed
    FailedBoth,
    /// A lookup call faulted
    Error,
}

impl Tier {
    /// Stable lower-case label used in output files
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Unresolved => "unresolved",
            Tier::ResolvedById => "resolved_by_id",
            Tier::ResolvedByName => "resolved_by_name",
            Tier::FailedBoth => "failed_both",
            Tier::Error => "error",
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Tier::ResolvedById | Tier::ResolvedByName)
    }

    /// Records in these tiers feed the retry pass
    pub fn needs_retry(&self) -> bool {
        matches!(self, Tier::FailedBoth | Tier::Error)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity reference under resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Source row, aligned with [`Batch::header`]
    pub row: Vec<String>,
    /// Namespace-prefixed identifier used for the tier-1 lookup
    pub raw_id: String,
    /// Display name used for the tier-2 lookup
    pub raw_name: String,
    pub category: String,
    pub canonical_id: Option<String>,
    pub canonical_name: Option<String>,
    pub tier: Tier,
    /// Set once the tier-1 identifier lookup came back without a match
    pub id_missed: bool,
    /// Lookup fault message, only when `tier == Tier::Error`
    pub fault: Option<String>,
    /// Identifier before normalization, when the normalizer rewrote it
    pub source_id: Option<String>,
    /// Name before normalization or augmentation, when either rewrote it
    pub source_name: Option<String>,
}

impl Record {
    /// Create an unresolved record without a source row
    pub fn new(raw_id: impl Into<String>, raw_name: impl Into<String>, category: Option<&str>) -> Self {
        let raw_id = raw_id.into();
        let raw_name = raw_name.into();
        let category = normalize_category(category);
        let row = vec![raw_id.clone(), raw_name.clone(), category.clone()];
        Self::with_row(row, raw_id, raw_name, category)
    }

    /// Create an unresolved record that carries its full source row
    pub fn with_row(row: Vec<String>, raw_id: String, raw_name: String, category: String) -> Self {
        Self {
            row,
            raw_id,
            raw_name,
            category,
            canonical_id: None,
            canonical_name: None,
            tier: Tier::Unresolved,
            id_missed: false,
            fault: None,
            source_id: None,
            source_name: None,
        }
    }

    /// Replace the lookup identifier, remembering the first original value
    pub fn rewrite_id(&mut self, id: String) {
        if id != self.raw_id {
            if self.source_id.is_none() {
                self.source_id = Some(self.raw_id.clone());
            }
            self.raw_id = id;
        }
    }

    /// Replace the lookup name, remembering the first original value
    pub fn rewrite_name(&mut self, name: String) {
        if name != self.raw_name {
            if self.source_name.is_none() {
                self.source_name = Some(self.raw_name.clone());
            }
            self.raw_name = name;
        }
    }

    /// Identifier as it appeared in the input
    pub fn original_id(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.raw_id)
    }

    /// Name as it appeared in the input
    pub fn original_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.raw_name)
    }

    /// Namespace prefix of the identifier (text before the first `:`)
    pub fn namespace(&self) -> Option<&str> {
        self.raw_id.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Drop any previous resolution so the record can go through the engine again
    pub fn reset_resolution(&mut self) {
        self.canonical_id = None;
        self.canonical_name = None;
        self.tier = Tier::Unresolved;
        self.id_missed = false;
        self.fault = None;
    }
}

fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNKNOWN_CATEGORY.to_string(),
    }
}

/// Ordered set of records processed in one run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    /// Input column names, in input order
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(header: Vec<String>, records: Vec<Record>) -> Self {
        Self { header, records }
    }

    /// Batch with the minimal `id`, `name`, `category` header
    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(
            vec!["id".to_string(), "name".to_string(), "category".to_string()],
            records,
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Fresh batch of the `FAILED_BOTH` / `ERROR` records, reset to unresolved
    pub fn retry_subset(&self) -> Batch {
        let records = self
            .records
            .iter()
            .filter(|r| r.tier.needs_retry())
            .cloned()
            .map(|mut r| {
                r.reset_resolution();
                r
            })
            .collect();
        Batch::new(self.header.clone(), records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_category_defaults_to_unknown() {
        assert_eq!(Record::new("A:1", "a", None).category, "unknown");
        assert_eq!(Record::new("A:1", "a", Some("  ")).category, "unknown");
        assert_eq!(Record::new("A:1", "a", Some("Gene")).category, "Gene");
    }

    #[test]
    fn test_rewrite_keeps_first_original() {
        let mut record = Record::new("EC:1.1.1.1", "alcohol dehydrogenase", None);
        record.rewrite_id("KEGG.ENZYME:1.1.1.1".to_string());
        record.rewrite_id("KEGG.ENZYME:1.1.1.2".to_string());
        assert_eq!(record.original_id(), "EC:1.1.1.1");
        assert_eq!(record.raw_id, "KEGG.ENZYME:1.1.1.2");

        // Same value is not a rewrite
        record.rewrite_name("alcohol dehydrogenase".to_string());
        assert!(record.source_name.is_none());
    }

    #[test]
    fn test_namespace() {
        assert_eq!(Record::new("NCBITaxon:562", "", None).namespace(), Some("NCBITaxon"));
        assert_eq!(Record::new("plain", "", None).namespace(), None);
    }

    #[test]
    fn test_retry_subset_resets_failed_and_errored() {
        let mut ok = Record::new("A:1", "a", None);
        ok.tier = Tier::ResolvedById;
        ok.canonical_id = Some("A:1".into());
        ok.canonical_name = Some("a".into());

        let mut failed = Record::new("B:2", "b", None);
        failed.tier = Tier::FailedBoth;
        failed.id_missed = true;

        let mut errored = Record::new("C:3", "c", None);
        errored.tier = Tier::Error;
        errored.fault = Some("boom".into());
        errored.canonical_id = Some("C:3".into());
        errored.canonical_name = Some("c".into());

        let batch = Batch::from_records(vec![ok, failed, errored]);
        let retry = batch.retry_subset();

        assert_eq!(retry.len(), 2);
        assert_eq!(retry.header, batch.header);
        for record in retry.iter() {
            assert_eq!(record.tier, Tier::Unresolved);
            assert!(record.canonical_id.is_none());
            assert!(record.fault.is_none());
            assert!(!record.id_missed);
        }
        assert_eq!(retry.records[0].raw_id, "B:2");
        assert_eq!(retry.records[1].raw_id, "C:3");
    }
}
