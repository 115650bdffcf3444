//! Resolution engine
//!
//! Drives the two-tier lookup over a batch, one record at a time:
//!
//! ```text
//! UNRESOLVED --id hit--> RESOLVED_BY_ID
//! UNRESOLVED --id miss--> name hit --> RESOLVED_BY_NAME
//!                         name miss --> FAILED_BOTH
//! lookup fault at either tier --> ERROR (canonical fields take the raw values)
//! ```
//!
//! Identifier evidence is trusted over name evidence: once the id lookup hits,
//! the name is never consulted. A fault on one record never aborts the batch.

use super::lookup_client::{CanonicalLookup, LookupResult};
use crate::models::{Batch, Record, Tier};
use std::slice;
use tracing::{debug, error, info};

/// Tagged result of resolving one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ResolvedById(LookupResult),
    ResolvedByName(LookupResult),
    FailedBoth,
    Error {
        message: String,
        /// The fault happened at tier 2, after the id lookup missed
        id_missed: bool,
    },
}

impl Outcome {
    pub fn tier(&self) -> Tier {
        match self {
            Outcome::ResolvedById(_) => Tier::ResolvedById,
            Outcome::ResolvedByName(_) => Tier::ResolvedByName,
            Outcome::FailedBoth => Tier::FailedBoth,
            Outcome::Error { .. } => Tier::Error,
        }
    }
}

/// A record whose lookup faulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFault {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub category: String,
    pub message: String,
}

/// Per-tier counts and faults of one engine pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub total: usize,
    pub resolved_by_id: usize,
    pub resolved_by_name: usize,
    pub failed_both: usize,
    /// Records whose tier-1 lookup missed
    pub id_misses: usize,
    pub faults: Vec<RecordFault>,
}

impl ResolutionReport {
    pub fn resolved(&self) -> usize {
        self.resolved_by_id + self.resolved_by_name
    }

    pub fn errors(&self) -> usize {
        self.faults.len()
    }
}

/// Two-tier resolver over a lookup authority
pub struct ResolutionEngine<'a> {
    lookup: &'a dyn CanonicalLookup,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(lookup: &'a dyn CanonicalLookup) -> Self {
        Self { lookup }
    }

    /// Decide the outcome for one record without changing it
    pub async fn resolve_record(&self, record: &Record) -> Outcome {
        let id = &record.raw_id;
        match self.lookup.lookup_by_id(slice::from_ref(id)).await {
            Ok(hits) => {
                if let Some(hit) = hits.get(id) {
                    return Outcome::ResolvedById(hit.clone());
                }
            }
            Err(e) => {
                return Outcome::Error {
                    message: e.to_string(),
                    id_missed: false,
                };
            }
        }

        let name = &record.raw_name;
        match self.lookup.lookup_by_name(slice::from_ref(name)).await {
            Ok(hits) => match hits.get(name) {
                Some(hit) => Outcome::ResolvedByName(hit.clone()),
                None => Outcome::FailedBoth,
            },
            Err(e) => Outcome::Error {
                message: e.to_string(),
                id_missed: true,
            },
        }
    }

    /// Resolve every record of a batch in order
    ///
    /// Any earlier resolution on the records is discarded first, so running
    /// twice against an unchanged authority gives the same result.
    pub async fn resolve_batch(&self, batch: &mut Batch) -> ResolutionReport {
        let mut report = ResolutionReport {
            total: batch.len(),
            ..Default::default()
        };

        for (index, record) in batch.records.iter_mut().enumerate() {
            record.reset_resolution();
            let outcome = self.resolve_record(record).await;

            match &outcome {
                Outcome::ResolvedById(_) => report.resolved_by_id += 1,
                Outcome::ResolvedByName(_) => report.resolved_by_name += 1,
                Outcome::FailedBoth => report.failed_both += 1,
                Outcome::Error { message, .. } => {
                    error!(index, id = %record.raw_id, name = %record.raw_name, "Error processing row: {}", message);
                    report.faults.push(RecordFault {
                        index,
                        id: record.raw_id.clone(),
                        name: record.raw_name.clone(),
                        category: record.category.clone(),
                        message: message.clone(),
                    });
                }
            }

            debug!(index, id = %record.raw_id, tier = %outcome.tier(), "Resolved record");
            apply_outcome(record, outcome);
            report.id_misses += usize::from(record.id_missed);
        }

        info!(
            total = report.total,
            by_id = report.resolved_by_id,
            by_name = report.resolved_by_name,
            failed_both = report.failed_both,
            errors = report.errors(),
            "Resolution pass complete"
        );

        report
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Write an outcome into a record
///
/// An empty preferred value falls back to the raw one, so resolved records
/// always carry both canonical fields. On error the raw values stand in as the
/// canonical pair; the tier and `fault` keep the error visible.
pub fn apply_outcome(record: &mut Record, outcome: Outcome) {
    record.tier = outcome.tier();
    match outcome {
        Outcome::ResolvedById(hit) => {
            record.canonical_id = Some(non_empty_or(hit.preferred_id, &record.raw_id));
            record.canonical_name = Some(non_empty_or(hit.preferred_name, &record.raw_name));
            record.id_missed = false;
        }
        Outcome::ResolvedByName(hit) => {
            record.canonical_id = Some(non_empty_or(hit.preferred_id, &record.raw_id));
            record.canonical_name = Some(non_empty_or(hit.preferred_name, &record.raw_name));
            record.id_missed = true;
        }
        Outcome::FailedBoth => {
            record.canonical_id = None;
            record.canonical_name = None;
            record.id_missed = true;
        }
        Outcome::Error { message, id_missed } => {
            record.canonical_id = Some(record.raw_id.clone());
            record.canonical_name = Some(record.raw_name.clone());
            record.id_missed = id_missed;
            record.fault = Some(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use microkg_common::{Error, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Map-backed authority that records every call
    #[derive(Default)]
    struct FakeLookup {
        ids: HashMap<String, LookupResult>,
        names: HashMap<String, LookupResult>,
        fail_ids: Vec<String>,
        fail_names: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    fn pick(
        table: &HashMap<String, LookupResult>,
        failing: &[String],
        keys: &[String],
    ) -> Result<HashMap<String, LookupResult>> {
        if keys.iter().any(|k| failing.contains(k)) {
            return Err(Error::Internal("lookup backend fault".into()));
        }
        Ok(keys
            .iter()
            .filter_map(|k| table.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    #[async_trait]
    impl CanonicalLookup for FakeLookup {
        async fn lookup_by_id(&self, ids: &[String]) -> Result<HashMap<String, LookupResult>> {
            self.calls.lock().unwrap().push(format!("id:{}", ids.join("|")));
            pick(&self.ids, &self.fail_ids, ids)
        }

        async fn lookup_by_name(&self, names: &[String]) -> Result<HashMap<String, LookupResult>> {
            self.calls.lock().unwrap().push(format!("name:{}", names.join("|")));
            pick(&self.names, &self.fail_names, names)
        }
    }

    #[tokio::test]
    async fn test_id_hit_skips_name_lookup() {
        let mut lookup = FakeLookup::default();
        lookup.ids.insert("A:1".into(), LookupResult::new("A:100", "Alpha"));
        lookup.names.insert("alpha".into(), LookupResult::new("Z:9", "Zeta"));

        let engine = ResolutionEngine::new(&lookup);
        let outcome = engine.resolve_record(&Record::new("A:1", "alpha", None)).await;

        assert_eq!(outcome, Outcome::ResolvedById(LookupResult::new("A:100", "Alpha")));
        assert_eq!(*lookup.calls.lock().unwrap(), vec!["id:A:1"]);
    }

    #[tokio::test]
    async fn test_name_result_used_after_id_miss() {
        let mut lookup = FakeLookup::default();
        lookup.names.insert("beta".into(), LookupResult::new("B:200", "Beta"));

        let engine = ResolutionEngine::new(&lookup);
        let outcome = engine.resolve_record(&Record::new("B:2", "beta", None)).await;

        assert_eq!(outcome, Outcome::ResolvedByName(LookupResult::new("B:200", "Beta")));
        assert_eq!(*lookup.calls.lock().unwrap(), vec!["id:B:2", "name:beta"]);
    }

    #[tokio::test]
    async fn test_fault_at_tier_two_marks_id_missed() {
        let lookup = FakeLookup {
            fail_names: vec!["gamma".into()],
            ..Default::default()
        };

        let engine = ResolutionEngine::new(&lookup);
        let mut batch = Batch::from_records(vec![Record::new("C:3", "gamma", None)]);
        let report = engine.resolve_batch(&mut batch).await;

        let record = &batch.records[0];
        assert_eq!(record.tier, Tier::Error);
        assert!(record.id_missed);
        assert_eq!(record.canonical_id.as_deref(), Some("C:3"));
        assert_eq!(record.canonical_name.as_deref(), Some("gamma"));
        assert!(record.fault.as_deref().unwrap().contains("lookup backend fault"));
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].index, 0);
    }

    #[tokio::test]
    async fn test_fault_does_not_abort_batch() {
        let mut lookup = FakeLookup {
            fail_ids: vec!["BAD:1".into()],
            ..Default::default()
        };
        lookup.ids.insert("GOOD:1".into(), LookupResult::new("GOOD:1", "good"));

        let engine = ResolutionEngine::new(&lookup);
        let mut batch = Batch::from_records(vec![
            Record::new("BAD:1", "bad", None),
            Record::new("GOOD:1", "good", None),
        ]);
        let report = engine.resolve_batch(&mut batch).await;

        assert_eq!(batch.records[0].tier, Tier::Error);
        assert!(!batch.records[0].id_missed);
        assert_eq!(batch.records[1].tier, Tier::ResolvedById);
        assert_eq!(report.resolved_by_id, 1);
        assert_eq!(report.errors(), 1);
    }

    #[tokio::test]
    async fn test_empty_preferred_values_fall_back_to_raw() {
        let mut lookup = FakeLookup::default();
        lookup.ids.insert("A:1".into(), LookupResult::new("A:100", ""));

        let engine = ResolutionEngine::new(&lookup);
        let mut batch = Batch::from_records(vec![Record::new("A:1", "alpha", None)]);
        engine.resolve_batch(&mut batch).await;

        assert_eq!(batch.records[0].canonical_id.as_deref(), Some("A:100"));
        assert_eq!(batch.records[0].canonical_name.as_deref(), Some("alpha"));
    }

    #[tokio::test]
    async fn test_every_record_gets_a_final_tier() {
        let mut lookup = FakeLookup {
            fail_ids: vec!["E:1".into()],
            ..Default::default()
        };
        lookup.ids.insert("A:1".into(), LookupResult::new("A:1", "a"));
        lookup.names.insert("b".into(), LookupResult::new("B:1", "b"));

        let engine = ResolutionEngine::new(&lookup);
        let mut batch = Batch::from_records(vec![
            Record::new("A:1", "a", None),
            Record::new("B:0", "b", None),
            Record::new("C:1", "c", None),
            Record::new("E:1", "e", None),
        ]);
        let report = engine.resolve_batch(&mut batch).await;

        for record in batch.iter() {
            assert_ne!(record.tier, Tier::Unresolved);
            if record.tier.is_resolved() {
                assert!(record.canonical_id.is_some() && record.canonical_name.is_some());
            }
        }
        assert_eq!(batch.records[2].tier, Tier::FailedBoth);
        assert!(batch.records[2].canonical_id.is_none());
        assert_eq!(report.id_misses, 2);
        assert_eq!(report.resolved(), 2);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let mut lookup = FakeLookup::default();
        lookup.ids.insert("A:1".into(), LookupResult::new("A:9", "a"));
        lookup.names.insert("b".into(), LookupResult::new("B:9", "b"));

        let engine = ResolutionEngine::new(&lookup);
        let mut batch = Batch::from_records(vec![
            Record::new("A:1", "a", None),
            Record::new("B:1", "b", None),
            Record::new("C:1", "c", None),
        ]);

        let first_report = engine.resolve_batch(&mut batch).await;
        let first = batch.clone();
        let second_report = engine.resolve_batch(&mut batch).await;

        assert_eq!(first, batch);
        assert_eq!(first_report, second_report);
    }
}
