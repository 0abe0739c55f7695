use jobflow::cli::commands::{OrderCommand, RunCommand, ValidateCommand};
use jobflow::cli::output::*;
use jobflow::cli::{Cli, Command};
use jobflow::core::config::PipelineConfig;
use jobflow::{ExecutionEvent, PipelineContext, ProcessController, TaskRegistry};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use std::fs::File;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    init_logging(&cli)?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_pipelines(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Order(cmd) => show_order(cmd)?,
        Command::Tasks => list_tasks(),
    }

    Ok(())
}

/// Console logging filtered by `RUST_LOG`, plus an optional plain-text log file
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match &cli.log_file {
        Some(path) => {
            let path = std::path::Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to set logging subscriber")?;

    Ok(())
}

async fn run_pipelines(cmd: &RunCommand) -> Result<()> {
    let registry = TaskRegistry::with_builtins();
    let mut controller = ProcessController::new();

    for file in &cmd.file {
        let config = PipelineConfig::from_file(file)
            .with_context(|| format!("Failed to load pipeline config {}", file))?;
        let pipeline = config.to_pipeline(&registry)?;
        let jobs = pipeline.len();
        controller.add_pipeline(pipeline);

        if !cmd.json {
            println!("{} Loaded pipeline: {} ({} jobs)", INFO, style(&config.name).bold(), jobs);
            if let Some(pipeline) = controller.get_pipeline_mut(&config.name) {
                attach_progress(pipeline);
            }
        }
    }

    let overrides: Option<PipelineContext> = if cmd.var.is_empty() {
        None
    } else {
        Some(cmd.var.iter().cloned().collect())
    };

    let results = match &cmd.pipeline {
        Some(name) => {
            let mut results = IndexMap::new();
            results.insert(name.clone(), controller.run_pipeline(name, overrides).await);
            results
        }
        None => controller.run_all_pipelines(overrides).await,
    };

    let mut failed = 0;
    let mut report = serde_json::Map::new();
    for (name, outcome) in &results {
        let summary = controller.get_pipeline(name).map(|p| p.status_summary());
        let ok = outcome.is_ok() && summary.as_ref().map_or(false, |s| s.status_counts.failed == 0);
        if !ok {
            failed += 1;
        }

        if cmd.json {
            report.insert(
                name.clone(),
                serde_json::json!({
                    "summary": summary,
                    "error": outcome.as_ref().err().map(|e| e.to_string()),
                }),
            );
            continue;
        }

        println!();
        if let Some(summary) = &summary {
            print!("{}", format_summary(summary));
        }
        match outcome {
            Ok(_) if ok => println!("{} {} completed {}", CHECK, style(name).bold(), style("successfully").green()),
            Ok(_) => println!("{} {} completed with {}", WARN, style(name).bold(), style("failed jobs").red()),
            Err(e) => {
                println!("{} {} {}", CROSS, style(name).bold(), style("failed").red());
                error!("{}", e);
            }
        }
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

/// Print events above a progress bar that lives for the duration of a run
fn attach_progress(pipeline: &mut jobflow::Pipeline) {
    let bar: Mutex<Option<ProgressBar>> = Mutex::new(None);

    pipeline.add_event_handler(move |event| {
        let Ok(mut bar) = bar.lock() else {
            return;
        };

        if let ExecutionEvent::PipelineStarted { total_jobs, .. } = event {
            *bar = Some(create_progress_bar(*total_jobs));
        }

        let line = format_execution_event(event);
        match bar.as_ref() {
            Some(progress) => {
                progress.println(line);
                if event.settles_job() {
                    progress.inc(1);
                } else if let Some(job) = event.job() {
                    progress.set_message(job.to_string());
                }
            }
            None => println!("{}", line),
        }

        if matches!(event, ExecutionEvent::PipelineCompleted { .. }) {
            if let Some(progress) = bar.take() {
                progress.finish_and_clear();
            }
        }
    });
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    let outcome = PipelineConfig::from_file(&cmd.file).and_then(|config| {
        let pipeline = config.to_pipeline(&TaskRegistry::with_builtins())?;
        let order = pipeline.execution_order()?;
        Ok((config, order))
    });

    print!("{}", format_validation(&outcome, cmd.json)?);
    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

fn show_order(cmd: &OrderCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let pipeline = config.to_pipeline(&TaskRegistry::with_builtins())?;

    println!("{} Execution order for {}:", INFO, style(&pipeline.name).bold());
    for (i, name) in pipeline.execution_order()?.iter().enumerate() {
        let deps = pipeline.job(name).map(|j| j.dependencies().join(", ")).unwrap_or_default();
        if deps.is_empty() {
            println!("  {}. {}", i + 1, style(name).cyan());
        } else {
            println!("  {}. {} {}", i + 1, style(name).cyan(), style(format!("(after {})", deps)).dim());
        }
    }

    Ok(())
}

fn list_tasks() {
    let registry = TaskRegistry::with_builtins();
    println!("{} Built-in tasks:", INFO);
    for (name, description) in registry.describe() {
        println!("  {:<10} {}", style(name).bold(), description);
    }
}
