//! CLI output formatting

use crate::{
    core::{config::PipelineConfig, JobStatus, StatusSummary},
    execution::ExecutionEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar over the jobs of a run
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    progress.set_style(style);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a job status for display
pub fn format_status(status: JobStatus) -> String {
    match status {
        JobStatus::Pending => style("PENDING").dim().to_string(),
        JobStatus::Running => style("RUNNING").yellow().to_string(),
        JobStatus::Success => style("SUCCESS").green().to_string(),
        JobStatus::Failed => style("FAILED").red().to_string(),
        JobStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Format a duration in seconds
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        None => "-".to_string(),
        Some(s) if s < 59.995 => format!("{:.2}s", s),
        Some(s) => {
            let total = s.round() as u64;
            if total < 3600 {
                format!("{}m {}s", total / 60, total % 60)
            } else {
                format!("{}h {}m", total / 3600, (total % 3600) / 60)
            }
        }
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            run_id,
            pipeline,
            total_jobs,
        } => format!(
            "{} Starting pipeline {} with {} jobs ({})",
            ROCKET,
            style(pipeline).bold(),
            total_jobs,
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::JobStarted { job } => format!("{} {}", SPINNER, style(job).cyan()),
        ExecutionEvent::JobCompleted { job, duration } => format!(
            "{} {} ({})",
            CHECK,
            style(job).green(),
            style(format_duration(*duration)).dim()
        ),
        ExecutionEvent::JobSkipped { job, dependency } => format!(
            "{} {} (dependency {} did not succeed)",
            SKIP,
            style(job).dim(),
            style(dependency).yellow()
        ),
        ExecutionEvent::JobFailed { job, error } => {
            format!("{} {}: {}", CROSS, style(job).red(), style(error).dim())
        }
        ExecutionEvent::PipelineCompleted {
            run_id,
            pipeline,
            success,
        } => {
            let status_str = if *success {
                format!("{} completed", style("successfully").green())
            } else {
                style("failed").red().to_string()
            };
            format!(
                "{} Pipeline {} ({}) {}",
                INFO,
                style(pipeline).bold(),
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format a status summary as an indented table
pub fn format_summary(summary: &StatusSummary) -> String {
    let counts = &summary.status_counts;
    let mut out = format!(
        "{} {}: {} jobs, {} succeeded, {} failed, {} skipped, {} pending in {}\n",
        INFO,
        style(&summary.pipeline).bold(),
        summary.total_jobs,
        style(counts.success).green(),
        style(counts.failed).red(),
        style(counts.skipped).dim(),
        counts.pending,
        format_duration(Some(summary.total_duration))
    );

    let width = summary.jobs.keys().map(|k| k.len()).max().unwrap_or(0);
    for (name, job) in &summary.jobs {
        out.push_str(&format!(
            "  {:<width$}  {}  {}",
            name,
            format_status(job.status),
            style(format_duration(job.duration)).dim(),
            width = width
        ));
        if let Some(error) = &job.error {
            out.push_str(&format!("  {}", style(error).red()));
        }
        out.push('\n');
    }

    out
}

/// Render the outcome of `validate`
///
/// With `json` the result is a single JSON document and nothing else.
pub fn format_validation(
    outcome: &anyhow::Result<(PipelineConfig, Vec<String>)>,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        let report = match outcome {
            Ok((config, order)) => serde_json::json!({
                "valid": true,
                "order": order,
                "pipeline": config,
            }),
            Err(e) => serde_json::json!({
                "valid": false,
                "error": format!("{:#}", e),
            }),
        };
        return Ok(format!("{}\n", serde_json::to_string_pretty(&report)?));
    }

    let mut out = format!("{} Validating pipeline...\n", INFO);
    match outcome {
        Ok((config, order)) => {
            out.push_str(&format!("{} Pipeline configuration is valid!\n", CHECK));
            out.push_str(&format!("  Name: {}\n", style(&config.name).bold()));
            if let Some(description) = &config.description {
                out.push_str(&format!("  Description: {}\n", description));
            }
            out.push_str(&format!("  Jobs: {}\n", style(config.jobs.len()).cyan()));
            out.push_str(&format!("  Order: {}\n", style(order.join(" -> ")).cyan()));
            out.push_str(&format!("  Failure policy: {:?}\n", config.failure_policy));
        }
        Err(e) => {
            out.push_str(&format!("{} Validation failed:\n", CROSS));
            out.push_str(&format!("  {}\n", style(format!("{:#}", e)).red()));
        }
    }
    Ok(out)
}
