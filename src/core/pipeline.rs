//! Pipeline domain model

use crate::core::{
    context::PipelineContext,
    job::{duration_secs, micros, Job},
    state::{JobSummary, StatusCounts, StatusSummary},
};
use crate::error::PipelineError;
use crate::execution::events::{EventHandler, ExecutionEvent};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What a run does when a job fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run and return the job's error
    #[default]
    FailFast,

    /// Record the failure, skip its dependents and finish the run
    SkipDependents,
}

/// A named set of jobs run in dependency order against a shared context
#[derive(Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Jobs by name, in insertion order
    pub(crate) jobs: IndexMap<String, Job>,

    /// Context shared by all jobs of a run
    pub(crate) context: PipelineContext,

    failure_policy: FailurePolicy,

    pub(crate) event_handlers: Vec<EventHandler>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: IndexMap::new(),
            context: PipelineContext::new(),
            failure_policy: FailurePolicy::default(),
            event_handlers: Vec::new(),
        }
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Add a job, rejecting duplicate names
    pub fn add_job(&mut self, job: Job) -> Result<(), PipelineError> {
        if self.jobs.contains_key(job.name()) {
            return Err(PipelineError::DuplicateJob {
                job: job.name().to_string(),
            });
        }
        self.jobs.insert(job.name().to_string(), job);
        Ok(())
    }

    /// Remove a job by name, keeping the order of the others
    pub fn remove_job(&mut self, name: &str) -> Option<Job> {
        self.jobs.shift_remove(name)
    }

    /// Get a job by name
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// All jobs, in insertion order
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// The shared context as left by the last run
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Register a handler called for every execution event
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    /// Put every job back to `Pending` and forget its previous outcome
    pub fn reset(&mut self) {
        for job in self.jobs.values_mut() {
            job.reset();
        }
    }

    /// Calculate the execution order (topological sort)
    ///
    /// Dependencies are visited depth-first before the job itself. Jobs
    /// with no ordering constraint between them keep their insertion order.
    pub fn execution_order(&self) -> Result<Vec<String>, PipelineError> {
        let mut order = Vec::with_capacity(self.jobs.len());
        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_progress: HashSet<&str> = HashSet::new();
        // Current DFS path: each frame is a job and the index of its next dependency
        let mut path: Vec<(&Job, usize)> = Vec::new();

        for root in self.jobs.values() {
            if visited.contains(root.name()) {
                continue;
            }
            in_progress.insert(root.name());
            path.push((root, 0));

            while let Some(frame) = path.last_mut() {
                let job: &Job = frame.0;
                let next = frame.1;
                frame.1 += 1;

                let Some(dep) = job.depends_on.get(next) else {
                    path.pop();
                    in_progress.remove(job.name());
                    visited.insert(job.name());
                    order.push(job.name.clone());
                    continue;
                };

                if visited.contains(dep.as_str()) {
                    continue;
                }
                if in_progress.contains(dep.as_str()) {
                    return Err(PipelineError::CyclicDependency {
                        cycle: cycle_path(&path, dep),
                    });
                }

                let dep_job = self
                    .jobs
                    .get(dep.as_str())
                    .ok_or_else(|| PipelineError::MissingDependency {
                        job: job.name.clone(),
                        dependency: dep.clone(),
                    })?;
                in_progress.insert(dep_job.name());
                path.push((dep_job, 0));
            }
        }

        debug!(pipeline = %self.name, jobs = order.len(), "Resolved execution order");
        Ok(order)
    }

    /// Summarize job statuses and timings
    pub fn status_summary(&self) -> StatusSummary {
        let mut status_counts = StatusCounts::default();
        let mut total_micros: i64 = 0;

        let jobs = self
            .jobs
            .iter()
            .map(|(name, job)| {
                status_counts.record(job.status);
                if let Some(elapsed) = job.elapsed() {
                    total_micros = total_micros.saturating_add(micros(elapsed));
                }
                let summary = JobSummary {
                    status: job.status,
                    duration: job.duration(),
                    error: job.error.clone(),
                };
                (name.clone(), summary)
            })
            .collect();

        StatusSummary {
            pipeline: self.name.clone(),
            total_jobs: self.jobs.len(),
            status_counts,
            total_duration: duration_secs(chrono::Duration::microseconds(total_micros)),
            jobs,
        }
    }
}

/// The jobs of `path` from `dep` onwards, closed by `dep` again
fn cycle_path(path: &[(&Job, usize)], dep: &str) -> Vec<String> {
    let start = path.iter().position(|(job, _)| job.name == dep).unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|(job, _)| job.name.clone()).collect();
    cycle.push(dep.to_string());
    cycle
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("jobs", &self.jobs)
            .field("context", &self.context)
            .field("failure_policy", &self.failure_policy)
            .field("event_handlers", &self.event_handlers.len())
            .finish()
    }
}
