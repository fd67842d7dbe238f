//! Pipeline composition and execution.

pub mod runner;

pub use runner::{run_standard, Pipeline, PipelineConfig, PipelineStep, DEFAULT_MAX_MISSING};
