//! Pipeline composition: gather, then harmonize and pair.

mod runner;

pub use runner::{Pipeline, PipelineConfig, PipelineStep};
