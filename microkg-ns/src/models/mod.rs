//! Data models for node synonymization

pub mod record;
pub mod triage;

pub use record::{Batch, Record, Tier, UNKNOWN_CATEGORY};
pub use triage::{TriageRow, TriageSet};
