//! Errors raised while building and running pipelines

use thiserror::Error;

/// Errors produced by jobs, pipelines and the process controller
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A job with this name is already registered in the pipeline
    #[error("Job '{job}' already exists in pipeline")]
    DuplicateJob { job: String },

    /// A job declares a dependency that is not part of the pipeline
    #[error("Job '{job}' depends on '{dependency}', which is not in the pipeline")]
    MissingDependency { job: String, dependency: String },

    /// The dependency graph contains a cycle
    #[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// The job's task returned an error
    #[error("Job '{job}' failed: {source}")]
    JobFailed {
        job: String,
        #[source]
        source: anyhow::Error,
    },

    /// No pipeline registered under this name
    #[error("Pipeline '{pipeline}' not found")]
    PipelineNotFound { pipeline: String },

    /// A job definition refers to a task that is not registered
    #[error("Job '{job}' uses unknown task '{task}'")]
    UnknownTask { job: String, task: String },
}
