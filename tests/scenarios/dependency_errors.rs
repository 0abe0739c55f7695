//! Test: Dependency Errors - duplicates, missing dependencies and cycles

use crate::helpers::*;
use jobflow::core::{Job, JobStatus, Pipeline};
use jobflow::PipelineError;
use serde_json::json;

#[test]
fn test_duplicate_job_keeps_original() {
    let recorder = Recorder::new();
    let mut pipeline = Pipeline::new("dup");
    pipeline.add_job(recorder.job("load").with_param("version", json!(1))).unwrap();

    let err = pipeline
        .add_job(recorder.job("load").with_param("version", json!(2)))
        .unwrap_err();

    assert_eq!(err.to_string(), "Job 'load' already exists in pipeline");
    assert_eq!(pipeline.len(), 1);
    assert_eq!(pipeline.job("load").unwrap().params()["version"], json!(1));
}

#[tokio::test]
async fn test_missing_dependency_fails_before_any_job() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "incomplete",
        vec![recorder.job("load"), recorder.job("save").depends_on(["process"])],
    );

    let result = run_pipeline(pipeline, None).await;

    match result.error() {
        Some(PipelineError::MissingDependency { job, dependency }) => {
            assert_eq!(job, "save");
            assert_eq!(dependency, "process");
        }
        other => panic!("expected MissingDependency, got {:?}", other),
    }
    assert!(recorder.calls().is_empty());
    assert_statuses(&result, &[("load", JobStatus::Pending), ("save", JobStatus::Pending)]);
}

#[tokio::test]
async fn test_cycle_fails_before_any_job() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "loop",
        vec![
            recorder.job("start"),
            recorder.job("review").depends_on(["implement"]),
            recorder.job("implement").depends_on(["start", "review"]),
        ],
    );

    let result = run_pipeline(pipeline, None).await;

    match result.error() {
        Some(PipelineError::CyclicDependency { cycle }) => {
            assert_eq!(cycle, &["review", "implement", "review"]);
        }
        other => panic!("expected CyclicDependency, got {:?}", other),
    }
    assert!(recorder.calls().is_empty());
}

/// A larger acyclic graph declared in reverse order
#[test]
fn test_generated_graph_is_topologically_sorted() {
    let mut pipeline = Pipeline::new("generated");
    for i in (0..40usize).rev() {
        let deps: Vec<String> = [i / 2, i.saturating_sub(3), i / 5]
            .into_iter()
            .filter(|&d| d < i)
            .map(|d| format!("job{}", d))
            .collect();
        pipeline
            .add_job(Job::from_fn(format!("job{}", i), |_, _| Ok(json!(null))).depends_on(deps))
            .unwrap();
    }

    let order = pipeline.execution_order().unwrap();

    assert_dependencies_respected(&pipeline, &order);
    assert_eq!(order, pipeline.execution_order().unwrap());
}
