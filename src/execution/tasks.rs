//! Task registry and built-in tasks
//!
//! Pipelines defined in YAML refer to tasks by name through the `uses`
//! field. The registry resolves those names to shared [`Task`] objects.

use crate::core::{JobParams, PipelineContext, Task};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Named tasks available to pipeline definitions
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, RegisteredTask>,
}

#[derive(Clone)]
struct RegisteredTask {
    task: Arc<dyn Task>,
    description: String,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in tasks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("emit", "Return `params.value`, or all params", EmitTask);
        registry.register("gather", "Collect the context keys listed in `params.keys`", GatherTask);
        registry.register("template", "Render `{{ path }}` placeholders in `params.template`", TemplateTask);
        registry.register("sleep", "Wait `params.millis` milliseconds", SleepTask);
        registry.register("shell", "Run `params.command` with `params.args`", ShellTask);
        registry
    }

    /// Register a task, replacing any task of the same name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        task: impl Task + 'static,
    ) {
        self.tasks.insert(
            name.into(),
            RegisteredTask {
                task: Arc::new(task),
                description: description.into(),
            },
        );
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).map(|t| t.task.clone())
    }

    /// Task names with their descriptions, sorted by name
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.tasks
            .iter()
            .map(|(name, t)| (name.as_str(), t.description.as_str()))
            .collect()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tasks.keys()).finish()
    }
}

/// Returns a fixed value
pub struct EmitTask;

#[async_trait]
impl Task for EmitTask {
    async fn run(&self, _context: &PipelineContext, params: &JobParams) -> Result<Value> {
        Ok(params
            .get("value")
            .cloned()
            .unwrap_or_else(|| Value::Object(params.clone())))
    }
}

/// Copies selected context entries into one object
pub struct GatherTask;

#[async_trait]
impl Task for GatherTask {
    async fn run(&self, context: &PipelineContext, params: &JobParams) -> Result<Value> {
        let keys = params
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("gather requires a `keys` list"))?;

        let mut gathered = serde_json::Map::new();
        for key in keys {
            let key = key
                .as_str()
                .ok_or_else(|| anyhow!("gather keys must be strings, got {}", key))?;
            let value = context
                .lookup(key)
                .ok_or_else(|| anyhow!("context has no value at '{}'", key))?;
            gathered.insert(key.to_string(), value.clone());
        }

        Ok(Value::Object(gathered))
    }
}

/// Renders a string template against the context
pub struct TemplateTask;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Replace `{{ path }}` placeholders with context values
///
/// Strings are inserted as is, other values as compact JSON. Unknown paths
/// are an error.
pub fn render_template(template: &str, context: &PipelineContext) -> Result<String> {
    let mut missing = Vec::new();
    let rendered = placeholder().replace_all(template, |caps: &Captures| {
        let path = &caps[1];
        match context.lookup(path) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                missing.push(path.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        bail!("template references unknown context values: {}", missing.join(", "));
    }
    Ok(rendered.into_owned())
}

#[async_trait]
impl Task for TemplateTask {
    async fn run(&self, context: &PipelineContext, params: &JobParams) -> Result<Value> {
        let template = params
            .get("template")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("template requires a `template` string"))?;

        Ok(Value::String(render_template(template, context)?))
    }
}

/// Sleeps for a number of milliseconds
pub struct SleepTask;

#[async_trait]
impl Task for SleepTask {
    async fn run(&self, _context: &PipelineContext, params: &JobParams) -> Result<Value> {
        let millis = params
            .get("millis")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow!("sleep requires a non-negative `millis`"))?;

        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(json!(millis))
    }
}

/// Runs an external command
///
/// Params: `command` (required), `args` (list of strings), `cwd`, and
/// `timeout_secs`. Placeholders in `args` are rendered against the context.
pub struct ShellTask;

#[async_trait]
impl Task for ShellTask {
    async fn run(&self, context: &PipelineContext, params: &JobParams) -> Result<Value> {
        let program = params
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("shell requires a `command` string"))?;

        let args = match params.get("args") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => render_template(s, context),
                    other => Ok(other.to_string()),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => bail!("shell `args` must be a list, got {}", other),
        };

        let mut command = Command::new(program);
        command.args(&args).kill_on_drop(true);
        if let Some(cwd) = params.get("cwd").and_then(Value::as_str) {
            command.current_dir(cwd);
        }

        debug!("Spawning '{}' with {} args", program, args.len());
        let output = match params.get("timeout_secs").and_then(Value::as_u64) {
            Some(secs) => timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| anyhow!("'{}' timed out after {} seconds", program, secs))?,
            None => command.output().await,
        }
        .with_context(|| format!("failed to run '{}'", program))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            warn!("'{}' exited with code {}: {}", program, exit_code, stderr.trim());
            bail!("'{}' exited with code {}: {}", program, exit_code, stderr.trim());
        }

        Ok(json!({
            "status": output.status.code(),
            "stdout": stdout,
            "stderr": stderr,
        }))
    }
}
