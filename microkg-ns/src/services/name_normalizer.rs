//! Name normalizer
//!
//! Deterministic rewrites applied to records awaiting the retry pass:
//! - enzyme-classification identifiers move to the enzyme-database namespace
//! - taxon names lose strain/isolate suffixes that defeat exact-name matching

use crate::models::{Batch, Record};
use tracing::debug;

pub const ENZYME_CLASS_PREFIX: &str = "EC:";
pub const ENZYME_DB_PREFIX: &str = "KEGG.ENZYME:";
pub const TAXON_PREFIX: &str = "NCBITaxon:";

/// Strain qualifier; everything from here on is dropped
pub const STRAIN_MARKER: &str = "CAG:";
pub const SPECIES_PLACEHOLDER: &str = "sp.";
pub const BACTERIUM: &str = "bacterium";

/// Rewrite an `EC:` identifier into the `KEGG.ENZYME:` namespace
pub fn remap_identifier(id: &str) -> String {
    match id.strip_prefix(ENZYME_CLASS_PREFIX) {
        Some(body) => format!("{}{}", ENZYME_DB_PREFIX, body),
        None => id.to_string(),
    }
}

fn keep_through(words: &[&str], token: &str) -> Option<String> {
    words
        .iter()
        .position(|w| *w == token)
        .map(|i| words[..=i].join(" "))
}

/// Shorten a raw taxon name to its binomial or placeholder form
///
/// Rules, first match wins:
/// 1. cut before the strain marker `CAG:`
/// 2. fewer than three words containing `sp.`: keep through `sp.`
/// 3. three or more words containing `bacterium` or `sp.`: keep through the
///    first of those, `bacterium` checked first
///
/// Names matching no rule come back unchanged. A rewrite that would leave an
/// empty name is not applied.
pub fn truncate_taxon_name(name: &str) -> String {
    if let Some(pos) = name.find(STRAIN_MARKER) {
        let head = name[..pos].trim();
        return if head.is_empty() { name.to_string() } else { head.to_string() };
    }

    let words: Vec<&str> = name.split_whitespace().collect();

    let truncated = if words.len() < 3 {
        keep_through(&words, SPECIES_PLACEHOLDER)
    } else {
        keep_through(&words, BACTERIUM).or_else(|| keep_through(&words, SPECIES_PLACEHOLDER))
    };

    truncated.unwrap_or_else(|| name.to_string())
}

/// Name to query for a record: taxon names are truncated, others untouched
pub fn normalize_name(id: &str, name: &str) -> String {
    if id.starts_with(TAXON_PREFIX) {
        truncate_taxon_name(name)
    } else {
        name.to_string()
    }
}

/// Counts of rewrites made over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub ids_remapped: usize,
    pub names_truncated: usize,
}

/// Apply both rewrite rules to one record
///
/// Returns `(id_changed, name_changed)`.
pub fn normalize_record(record: &mut Record) -> (bool, bool) {
    let original_id = record.raw_id.clone();
    let new_name = normalize_name(&original_id, &record.raw_name);
    let new_id = remap_identifier(&original_id);

    let id_changed = new_id != record.raw_id;
    let name_changed = new_name != record.raw_name;

    if id_changed || name_changed {
        debug!(
            id = %original_id,
            new_id = %new_id,
            name = %record.raw_name,
            new_name = %new_name,
            "Normalized record"
        );
    }

    record.rewrite_id(new_id);
    record.rewrite_name(new_name);
    (id_changed, name_changed)
}

/// Apply both rewrite rules to every record of a batch
pub fn normalize_batch(batch: &mut Batch) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    for record in &mut batch.records {
        let (id_changed, name_changed) = normalize_record(record);
        stats.ids_remapped += usize::from(id_changed);
        stats.names_truncated += usize::from(name_changed);
    }
    stats
}
