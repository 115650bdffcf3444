//! Workflow orchestration

pub mod pipeline;

pub use pipeline::{
    add_prepared_columns, is_prepared, prepare_batch, retry_layout, run_prepare, PassOutcome, Pipeline, PrepareStats,
    RunSummary,
};
