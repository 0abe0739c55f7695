//! Process controller - manages several named pipelines

use crate::{
    core::{Pipeline, PipelineContext, StatusSummary},
    error::PipelineError,
};
use indexmap::IndexMap;
use tracing::{error, info, warn};

/// Holds pipelines by name and runs one or all of them
#[derive(Debug, Default)]
pub struct ProcessController {
    pipelines: IndexMap<String, Pipeline>,
}

impl ProcessController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline under its name, returning the one it replaces
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Option<Pipeline> {
        let previous = self.pipelines.insert(pipeline.name.clone(), pipeline);
        if let Some(ref replaced) = previous {
            warn!("Replacing pipeline '{}'", replaced.name);
        }
        previous
    }

    pub fn get_pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn get_pipeline_mut(&mut self, name: &str) -> Option<&mut Pipeline> {
        self.pipelines.get_mut(name)
    }

    /// Names of all registered pipelines, in insertion order
    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Run a single pipeline
    pub async fn run_pipeline(
        &mut self,
        name: &str,
        context: Option<PipelineContext>,
    ) -> Result<PipelineContext, PipelineError> {
        let pipeline = self
            .pipelines
            .get_mut(name)
            .ok_or_else(|| PipelineError::PipelineNotFound {
                pipeline: name.to_string(),
            })?;

        info!("Running pipeline '{}'", name);
        pipeline.run(context).await
    }

    /// Run every pipeline in insertion order
    ///
    /// A failing pipeline does not stop the others; its error is kept in
    /// the returned map.
    pub async fn run_all_pipelines(
        &mut self,
        context: Option<PipelineContext>,
    ) -> IndexMap<String, Result<PipelineContext, PipelineError>> {
        let mut results = IndexMap::with_capacity(self.pipelines.len());

        for (name, pipeline) in self.pipelines.iter_mut() {
            info!("Running pipeline '{}'", name);
            let outcome = pipeline.run(context.clone()).await;
            if let Err(ref e) = outcome {
                error!("Pipeline '{}' failed: {}", name, e);
            }
            results.insert(name.clone(), outcome);
        }

        results
    }

    /// Status summaries of all pipelines
    pub fn all_status(&self) -> IndexMap<String, StatusSummary> {
        self.pipelines
            .iter()
            .map(|(name, pipeline)| (name.clone(), pipeline.status_summary()))
            .collect()
    }
}
