//! jobflow - an in-process job runner with dependency-ordered pipelines

pub mod cli;
pub mod core;
pub mod error;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{FailurePolicy, Job, JobParams, JobStatus, Pipeline, PipelineContext, StatusSummary, Task};
pub use error::PipelineError;
pub use execution::{ExecutionEvent, ProcessController, TaskRegistry};
