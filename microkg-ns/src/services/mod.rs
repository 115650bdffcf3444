//! Service modules for the synonymization workflow

pub mod gene_augmenter;
pub mod lookup_client;
pub mod name_normalizer;
pub mod resolution_engine;
pub mod statistics;
pub mod triage_writer;

pub use gene_augmenter::{
    AugmentError, AugmentationStats, EutilsClient, GeneAugmenter, GeneDescriptionSource,
};
pub use lookup_client::{CanonicalLookup, LookupResult, SqliteSynonymizer};
pub use name_normalizer::{normalize_batch, NormalizeStats};
pub use resolution_engine::{Outcome, ResolutionEngine, ResolutionReport};
pub use statistics::PerformanceSummary;
pub use triage_writer::{TriageLayout, TriageWriter};
