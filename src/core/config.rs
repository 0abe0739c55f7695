//! Pipeline configuration from YAML

use crate::core::{FailurePolicy, Job, JobParams, Pipeline, PipelineContext};
use crate::error::PipelineError;
use crate::execution::TaskRegistry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// What to do when a job fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Values merged into the context before the first job runs
    #[serde(default)]
    pub context: HashMap<String, Value>,

    /// Pipeline jobs
    pub jobs: Vec<JobConfig>,
}

/// Job configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job name
    pub name: String,

    /// Name of the registered task to run
    pub uses: String,

    /// Names of the jobs this job depends on
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Static parameters passed to the task
    #[serde(default)]
    pub params: JobParams,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.name.as_str()) {
                anyhow::bail!("Duplicate job name: {}", job.name);
            }
        }

        for job in &self.jobs {
            for dep in &job.depends_on {
                if !seen.contains(dep.as_str()) {
                    anyhow::bail!("Job '{}' depends on non-existent job '{}'", job.name, dep);
                }
            }
        }

        self.check_cycles()
    }

    /// Check for cycles in the job dependency graph
    ///
    /// Iterative depth-first walk; unknown dependencies are left to
    /// `validate`.
    fn check_cycles(&self) -> Result<()> {
        let by_name: HashMap<&str, &JobConfig> =
            self.jobs.iter().map(|job| (job.name.as_str(), job)).collect();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_stack: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&JobConfig, usize)> = Vec::new();

        for root in &self.jobs {
            if visited.contains(root.name.as_str()) {
                continue;
            }
            on_stack.insert(root.name.as_str());
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let job: &JobConfig = frame.0;
                let next = frame.1;
                frame.1 += 1;

                let Some(dep) = job.depends_on.get(next) else {
                    stack.pop();
                    on_stack.remove(job.name.as_str());
                    visited.insert(job.name.as_str());
                    continue;
                };

                if visited.contains(dep.as_str()) {
                    continue;
                }
                if on_stack.contains(dep.as_str()) {
                    let start = stack.iter().position(|(j, _)| j.name == *dep).unwrap_or(0);
                    let mut cycle: Vec<String> = stack[start..].iter().map(|(j, _)| j.name.clone()).collect();
                    cycle.push(dep.clone());
                    return Err(PipelineError::CyclicDependency { cycle }.into());
                }
                if let Some(dep_job) = by_name.get(dep.as_str()) {
                    on_stack.insert(dep_job.name.as_str());
                    stack.push((*dep_job, 0));
                }
            }
        }

        Ok(())
    }

    /// The configured initial context
    pub fn initial_context(&self) -> PipelineContext {
        PipelineContext::from(self.context.clone())
    }

    /// Build a pipeline, resolving each job's task in `registry`
    ///
    /// The configured context is placed in the pipeline's context so that
    /// it is visible to the first run.
    pub fn to_pipeline(&self, registry: &TaskRegistry) -> Result<Pipeline, PipelineError> {
        let mut pipeline = Pipeline::new(&self.name).with_failure_policy(self.failure_policy);
        pipeline.context.merge(self.initial_context());

        for job_config in &self.jobs {
            let task = registry
                .get(&job_config.uses)
                .ok_or_else(|| PipelineError::UnknownTask {
                    job: job_config.name.clone(),
                    task: job_config.uses.clone(),
                })?;

            let job = Job::from_shared(&job_config.name, task)
                .depends_on(job_config.depends_on.iter().cloned())
                .with_params(job_config.params.clone());
            pipeline.add_job(job)?;
        }

        Ok(pipeline)
    }
}
