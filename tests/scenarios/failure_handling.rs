//! Test: Failure Handling - fail-fast runs and skipped dependents

use crate::helpers::*;
use jobflow::core::{FailurePolicy, JobStatus};
use jobflow::{ExecutionEvent, PipelineError};

/// A failing job aborts the run; nothing after it is touched
#[tokio::test]
async fn test_fail_fast_aborts_run() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "fragile",
        vec![
            recorder.job("load"),
            recorder.failing("process", "invalid record at line 3"),
            recorder.job("save").depends_on(["process"]),
            recorder.job("notify"),
        ],
    );

    let result = run_pipeline(pipeline, None).await;

    match result.error() {
        Some(PipelineError::JobFailed { job, source }) => {
            assert_eq!(job, "process");
            assert_eq!(source.to_string(), "invalid record at line 3");
        }
        other => panic!("expected JobFailed, got {:?}", other),
    }
    assert_eq!(recorder.calls(), ["load", "process"]);
    assert_statuses(
        &result,
        &[
            ("load", JobStatus::Success),
            ("process", JobStatus::Failed),
            ("save", JobStatus::Pending),
            ("notify", JobStatus::Pending),
        ],
    );

    // Partial state stays inspectable
    let summary = result.pipeline.status_summary();
    assert_eq!(summary.status_counts.success, 1);
    assert_eq!(summary.status_counts.failed, 1);
    assert_eq!(summary.status_counts.pending, 2);
    assert_eq!(summary.jobs["process"].error.as_deref(), Some("invalid record at line 3"));
    assert!(summary.jobs["process"].duration.is_some());
    assert!(result.context().job_result("load").is_some());
    assert!(result.context().job_result("process").is_none());
}

/// With skip-and-continue, dependents of a failure are skipped transitively
#[tokio::test]
async fn test_skip_dependents_transitively() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "tolerant",
        vec![
            recorder.failing("fetch", "503 Service Unavailable"),
            recorder.job("process").depends_on(["fetch"]),
            recorder.job("store").depends_on(["process"]),
            recorder.job("export").depends_on(["process", "config"]),
            recorder.job("config"),
        ],
    )
    .with_failure_policy(FailurePolicy::SkipDependents);

    let result = run_pipeline(pipeline, None).await;

    assert!(result.is_success());
    assert_eq!(recorder.calls(), ["fetch", "config"]);
    assert_statuses(
        &result,
        &[
            ("fetch", JobStatus::Failed),
            ("process", JobStatus::Skipped),
            ("store", JobStatus::Skipped),
            ("export", JobStatus::Skipped),
            ("config", JobStatus::Success),
        ],
    );

    let summary = result.pipeline.status_summary();
    assert_eq!(summary.status_counts.skipped, 3);
    assert!(summary.jobs["store"].duration.is_none());
    assert!(summary.jobs["store"].error.is_none());
}

/// Skipped jobs never pass through `Running`
#[tokio::test]
async fn test_skipped_jobs_never_start() {
    let recorder = Recorder::new();
    let mut pipeline = pipeline_of(
        "observed",
        vec![recorder.failing("a", "boom"), recorder.job("b").depends_on(["a"])],
    )
    .with_failure_policy(FailurePolicy::SkipDependents);
    let events = collect_events(&mut pipeline);

    run_pipeline(pipeline, None).await;

    let events = events.lock().unwrap();
    let started: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::JobStarted { job } => Some(job.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(started, ["a"]);
    assert!(events.iter().any(|e| matches!(
        e,
        ExecutionEvent::JobSkipped { job, dependency } if job == "b" && dependency == "a"
    )));
}

/// Under fail-fast the dependents of the failing job are never reached
#[tokio::test]
async fn test_fail_fast_never_reaches_dependents() {
    let recorder = Recorder::new();
    let mut pipeline = pipeline_of(
        "chain",
        vec![
            recorder.failing("a", "boom"),
            recorder.job("b").depends_on(["a"]),
            recorder.job("c").depends_on(["b"]),
        ],
    );
    let events = collect_events(&mut pipeline);

    let result = run_pipeline(pipeline, None).await;

    assert!(!result.is_success());
    assert!(events
        .lock()
        .unwrap()
        .iter()
        .all(|e| !matches!(e, ExecutionEvent::JobSkipped { .. })));
    assert_statuses(&result, &[("b", JobStatus::Pending), ("c", JobStatus::Pending)]);
}
