//! Events emitted while a pipeline runs

use std::sync::Arc;
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        pipeline: String,
        total_jobs: usize,
    },
    JobStarted {
        job: String,
    },
    JobCompleted {
        job: String,
        /// Seconds
        duration: Option<f64>,
    },
    JobSkipped {
        job: String,
        /// The dependency that did not succeed
        dependency: String,
    },
    JobFailed {
        job: String,
        error: String,
    },
    PipelineCompleted {
        run_id: Uuid,
        pipeline: String,
        success: bool,
    },
}

impl ExecutionEvent {
    /// The job this event is about, if any
    pub fn job(&self) -> Option<&str> {
        match self {
            ExecutionEvent::JobStarted { job }
            | ExecutionEvent::JobCompleted { job, .. }
            | ExecutionEvent::JobSkipped { job, .. }
            | ExecutionEvent::JobFailed { job, .. } => Some(job),
            ExecutionEvent::PipelineStarted { .. } | ExecutionEvent::PipelineCompleted { .. } => None,
        }
    }

    /// True for events after which the job will not change again this run
    pub fn settles_job(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::JobCompleted { .. }
                | ExecutionEvent::JobSkipped { .. }
                | ExecutionEvent::JobFailed { .. }
        )
    }
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;
