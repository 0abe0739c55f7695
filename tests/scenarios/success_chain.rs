//! Test: Success Chain - results flow from job to job through the context

use crate::helpers::*;
use jobflow::core::{Job, JobStatus, PipelineContext};
use serde_json::{json, Value};

fn records_from(ctx: &PipelineContext, path: &str) -> anyhow::Result<Vec<i64>> {
    let values = ctx
        .lookup(path)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("no list at '{}'", path))?;
    Ok(values.iter().filter_map(Value::as_i64).collect())
}

/// Load, process and save, each reading the previous result
#[tokio::test]
async fn test_load_process_save() {
    let pipeline = pipeline_of(
        "data_pipeline",
        vec![
            Job::from_fn("load", |_, _| Ok(json!({"records": [1, 2, 3, 4, 5]}))),
            Job::from_fn("process", |ctx, _| {
                let records = records_from(ctx, "job_load_result.records")?;
                Ok(json!({"processed": records.iter().map(|x| x * 2).collect::<Vec<_>>()}))
            })
            .depends_on(["load"]),
            Job::from_fn("save", |ctx, _| {
                let processed = records_from(ctx, "job_process_result.processed")?;
                Ok(json!({"saved_count": processed.len()}))
            })
            .depends_on(["process"]),
        ],
    );

    assert_eq!(pipeline.execution_order().unwrap(), ["load", "process", "save"]);

    let result = run_pipeline(pipeline, None).await;
    assert!(result.is_success());

    let ctx = result.context();
    assert_eq!(ctx.lookup("job_load_result.records"), Some(&json!([1, 2, 3, 4, 5])));
    assert_eq!(ctx.lookup("job_process_result.processed"), Some(&json!([2, 4, 6, 8, 10])));
    assert_eq!(ctx.lookup("job_save_result.saved_count"), Some(&json!(5)));

    let summary = result.pipeline.status_summary();
    assert_eq!(summary.status_counts.success, 3);
    assert!(summary.is_success());
}

/// Static params are passed to the task alongside the context
#[tokio::test]
async fn test_static_params() {
    let pipeline = pipeline_of(
        "scaled",
        vec![
            Job::from_fn("base", |_, _| Ok(json!({"x": 1}))),
            Job::from_fn("scale", |ctx, params| {
                let x = ctx.lookup("job_base_result.x").and_then(Value::as_i64).unwrap_or(0);
                let factor = params.get("factor").and_then(Value::as_i64).unwrap_or(1);
                Ok(json!(x * factor))
            })
            .with_param("factor", json!(2))
            .depends_on(["base"]),
        ],
    );

    let result = run_pipeline(pipeline, None).await;

    assert_eq!(result.context().job_result("scale"), Some(&json!(2)));
    let summary = result.pipeline.status_summary();
    assert_eq!(summary.total_jobs, 2);
    assert_eq!(summary.jobs["base"].status, JobStatus::Success);
    assert_eq!(summary.jobs["scale"].status, JobStatus::Success);
}

/// One producer feeding three consumers, declared out of order
#[tokio::test]
async fn test_fan_out() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "integration",
        vec![
            recorder.job("dashboard").depends_on(["process"]),
            recorder.job("store").depends_on(["process"]),
            recorder.job("process").depends_on(["fetch"]),
            recorder.job("export").depends_on(["process"]),
            recorder.job("fetch"),
        ],
    );

    let order = pipeline.execution_order().unwrap();
    assert_dependencies_respected(&pipeline, &order);
    assert_eq!(order, ["fetch", "process", "dashboard", "store", "export"]);

    let result = run_pipeline(pipeline, None).await;

    assert_eq!(recorder.calls(), order);
    for name in ["fetch", "process", "dashboard", "store", "export"] {
        assert_eq!(result.context().job_result(name), Some(&json!(name)));
    }
}

/// Summary timings add up and the summary does not change between calls
#[tokio::test]
async fn test_summary_after_run() {
    let recorder = Recorder::new();
    let pipeline = pipeline_of(
        "timed",
        vec![recorder.job("a"), recorder.job("b").depends_on(["a"]), recorder.job("c")],
    );

    let result = run_pipeline(pipeline, None).await;
    let summary = result.pipeline.status_summary();

    let sum: f64 = summary.jobs.values().filter_map(|j| j.duration).sum();
    assert!((summary.total_duration - sum).abs() < 1e-9);
    assert!(summary.jobs.values().all(|j| j.duration.is_some() && j.error.is_none()));
    assert_eq!(summary, result.pipeline.status_summary());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["pipeline"], "timed");
    assert_eq!(json["status_counts"]["success"], 3);
    assert_eq!(json["jobs"]["b"]["status"], "success");
}
