//! Job domain model

use crate::core::{context::PipelineContext, state::JobStatus};
use crate::error::PipelineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Static parameters bound to a job when it is defined
pub type JobParams = serde_json::Map<String, Value>;

/// The work a job performs
///
/// A task reads the shared context and the job's static parameters and
/// returns a value, which the pipeline stores under the job's result key.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self, context: &PipelineContext, params: &JobParams) -> anyhow::Result<Value>;
}

/// Adapter running a plain closure as a [`Task`]
pub struct FnTask<F>(F);

impl<F> FnTask<F>
where
    F: Fn(&PipelineContext, &JobParams) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Task for FnTask<F>
where
    F: Fn(&PipelineContext, &JobParams) -> anyhow::Result<Value> + Send + Sync,
{
    async fn run(&self, context: &PipelineContext, params: &JobParams) -> anyhow::Result<Value> {
        (self.0)(context, params)
    }
}

/// A single job in a pipeline
#[derive(Clone)]
pub struct Job {
    /// Unique job name
    pub(crate) name: String,

    task: Arc<dyn Task>,

    /// Names of the jobs this job depends on
    pub(crate) depends_on: Vec<String>,

    params: JobParams,

    // Runtime state, written only by the owning pipeline
    pub(crate) status: JobStatus,
    pub(crate) result: Option<Value>,
    pub(crate) error: Option<String>,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) end_time: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a job from a task
    pub fn new(name: impl Into<String>, task: impl Task + 'static) -> Self {
        Self::from_shared(name, Arc::new(task))
    }

    /// Create a job from a closure
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&PipelineContext, &JobParams) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(name, FnTask::new(f))
    }

    /// Create a job from a task shared with other jobs
    pub fn from_shared(name: impl Into<String>, task: Arc<dyn Task>) -> Self {
        Self {
            name: name.into(),
            task,
            depends_on: Vec::new(),
            params: JobParams::new(),
            status: JobStatus::Pending,
            result: None,
            error: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Declare the jobs this job depends on
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the static parameters
    pub fn with_params(mut self, params: JobParams) -> Self {
        self.params = params;
        self
    }

    /// Bind a single static parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn params(&self) -> &JobParams {
        &self.params
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Output of the last successful execution
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Error message of the last failed execution
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    /// Run the task against the shared context
    ///
    /// Status moves to `Running` before the task is invoked and to
    /// `Success` or `Failed` afterwards. `end_time` is recorded either way.
    pub async fn execute(&mut self, context: &PipelineContext) -> Result<Value, PipelineError> {
        self.status = JobStatus::Running;
        self.start_time = Some(Utc::now());
        self.end_time = None;

        let outcome = self.task.run(context, &self.params).await;
        self.end_time = Some(Utc::now());

        match outcome {
            Ok(value) => {
                self.result = Some(value.clone());
                self.status = JobStatus::Success;
                Ok(value)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.status = JobStatus::Failed;
                Err(PipelineError::JobFailed {
                    job: self.name.clone(),
                    source: e,
                })
            }
        }
    }

    /// Elapsed time of the last execution
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Execution duration in seconds, `None` if the job never finished
    pub fn duration(&self) -> Option<f64> {
        self.elapsed().map(duration_secs)
    }

    pub(crate) fn skip(&mut self) {
        self.status = JobStatus::Skipped;
    }

    /// Forget the outcome of previous runs
    pub(crate) fn reset(&mut self) {
        self.status = JobStatus::Pending;
        self.result = None;
        self.error = None;
        self.start_time = None;
        self.end_time = None;
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("params", &self.params)
            .field("status", &self.status)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .finish_non_exhaustive()
    }
}

/// Convert a chrono duration to fractional seconds with microsecond precision
pub(crate) fn duration_secs(duration: chrono::Duration) -> f64 {
    micros(duration) as f64 / 1_000_000.0
}

pub(crate) fn micros(duration: chrono::Duration) -> i64 {
    duration.num_microseconds().unwrap_or(i64::MAX)
}
