//! Test utility functions for jobflow
#![allow(dead_code)]

use jobflow::core::{Job, JobStatus, Pipeline, PipelineContext};
use jobflow::{ExecutionEvent, PipelineError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Builds jobs that record the order in which they are called
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A job that succeeds with its own name as result
    pub fn job(&self, name: &str) -> Job {
        self.job_returning(name, json!(name))
    }

    /// A job that succeeds with a fixed value
    pub fn job_returning(&self, name: &str, value: Value) -> Job {
        let calls = self.calls.clone();
        let owned = name.to_string();
        Job::from_fn(name, move |_, _| {
            calls.lock().unwrap().push(owned.clone());
            Ok(value.clone())
        })
    }

    /// A job that always fails with `message`
    pub fn failing(&self, name: &str, message: &str) -> Job {
        let calls = self.calls.clone();
        let owned = name.to_string();
        let message = message.to_string();
        Job::from_fn(name, move |_, _| {
            calls.lock().unwrap().push(owned.clone());
            Err(anyhow::anyhow!(message.clone()))
        })
    }

    /// Names of the jobs that ran, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

/// Record every event a pipeline emits
pub fn collect_events(pipeline: &mut Pipeline) -> Arc<Mutex<Vec<ExecutionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    pipeline.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

/// Test result from running a pipeline
pub struct PipelineTestResult {
    pub pipeline: Pipeline,
    pub outcome: Result<PipelineContext, PipelineError>,
}

impl PipelineTestResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn context(&self) -> &PipelineContext {
        self.pipeline.context()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }

    pub fn status(&self, job: &str) -> JobStatus {
        self.pipeline
            .job(job)
            .unwrap_or_else(|| panic!("job '{}' not in pipeline", job))
            .status()
    }
}

/// Run a pipeline to completion or failure and keep both for inspection
pub async fn run_pipeline(mut pipeline: Pipeline, initial: Option<PipelineContext>) -> PipelineTestResult {
    let outcome = pipeline.run(initial).await;
    PipelineTestResult { pipeline, outcome }
}

/// Build a pipeline from jobs, panicking on duplicates
pub fn pipeline_of(name: &str, jobs: Vec<Job>) -> Pipeline {
    let mut pipeline = Pipeline::new(name);
    for job in jobs {
        pipeline.add_job(job).unwrap();
    }
    pipeline
}

/// Assert the final status of each listed job
pub fn assert_statuses(result: &PipelineTestResult, expected: &[(&str, JobStatus)]) {
    for (job, status) in expected {
        assert_eq!(
            result.status(job),
            *status,
            "job '{}' should be {:?}",
            job,
            status
        );
    }
}

/// Assert that every job comes after all of its dependencies, transitively
pub fn assert_dependencies_respected(pipeline: &Pipeline, order: &[String]) {
    assert_eq!(order.len(), pipeline.len(), "every job appears exactly once");
    let position = |name: &str| {
        order
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("job '{}' missing from order", name))
    };
    for job in pipeline.jobs() {
        for dep in job.dependencies() {
            assert!(
                position(dep) < position(job.name()),
                "'{}' must run before '{}'",
                dep,
                job.name()
            );
        }
    }
}
