//! Pipeline run loop - executes jobs in dependency order

use crate::{
    core::{FailurePolicy, JobStatus, Pipeline, PipelineContext},
    error::PipelineError,
    execution::events::ExecutionEvent,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl Pipeline {
    /// Execute all jobs of the pipeline
    ///
    /// `initial_context` is merged into the shared context first. Jobs then
    /// run one at a time in [`Pipeline::execution_order`]; each result is
    /// stored under `job_<name>_result`. A job whose dependencies did not
    /// all succeed is marked `Skipped` without running.
    ///
    /// Under [`FailurePolicy::FailFast`] the first job error aborts the run
    /// and is returned as is; jobs that were not reached keep their status.
    pub async fn run(
        &mut self,
        initial_context: Option<PipelineContext>,
    ) -> Result<PipelineContext, PipelineError> {
        if let Some(initial) = initial_context {
            debug!(pipeline = %self.name, keys = initial.len(), "Merging initial context");
            self.context.merge(initial);
        }

        let order = self.execution_order().map_err(|e| {
            error!("Pipeline '{}' cannot start: {}", self.name, e);
            e
        })?;

        let run_id = Uuid::new_v4();
        info!("Starting pipeline '{}' with {} jobs ({})", self.name, order.len(), run_id);
        self.emit(ExecutionEvent::PipelineStarted {
            run_id,
            pipeline: self.name.clone(),
            total_jobs: order.len(),
        });

        for name in &order {
            if let Some(dependency) = self.unsatisfied_dependency(name) {
                warn!("Skipping job '{}' due to failed dependency '{}'", name, dependency);
                if let Some(job) = self.jobs.get_mut(name) {
                    job.skip();
                }
                self.emit(ExecutionEvent::JobSkipped {
                    job: name.clone(),
                    dependency,
                });
                continue;
            }

            info!("Executing job '{}'", name);
            self.emit(ExecutionEvent::JobStarted { job: name.clone() });

            let Some(job) = self.jobs.get_mut(name) else {
                continue;
            };
            match job.execute(&self.context).await {
                Ok(result) => {
                    let duration = job.duration();
                    self.context.set_job_result(name, result);
                    info!(
                        "Job '{}' completed successfully in {:.2}s",
                        name,
                        duration.unwrap_or_default()
                    );
                    self.emit(ExecutionEvent::JobCompleted {
                        job: name.clone(),
                        duration,
                    });
                }
                Err(e) => {
                    let message = job.error().unwrap_or_default().to_string();
                    error!("Job '{}' failed: {}", name, message);
                    self.emit(ExecutionEvent::JobFailed {
                        job: name.clone(),
                        error: message,
                    });

                    if self.failure_policy() == FailurePolicy::FailFast {
                        self.emit(ExecutionEvent::PipelineCompleted {
                            run_id,
                            pipeline: self.name.clone(),
                            success: false,
                        });
                        return Err(e);
                    }
                }
            }
        }

        let success = self.jobs.values().all(|job| job.status == JobStatus::Success);
        if success {
            info!("Pipeline '{}' completed", self.name);
        } else {
            warn!("Pipeline '{}' completed with failed or skipped jobs", self.name);
        }
        self.emit(ExecutionEvent::PipelineCompleted {
            run_id,
            pipeline: self.name.clone(),
            success,
        });

        Ok(self.context.clone())
    }

    /// First dependency of `name` that has not succeeded
    fn unsatisfied_dependency(&self, name: &str) -> Option<String> {
        let job = self.jobs.get(name)?;
        job.depends_on
            .iter()
            .find(|dep| {
                self.jobs
                    .get(dep.as_str())
                    .map_or(true, |d| d.status != JobStatus::Success)
            })
            .cloned()
    }

    fn emit(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }
}
