//! Execution state models

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job has not run yet
    Pending,
    /// Job is currently running
    Running,
    /// Job completed successfully
    Success,
    /// Job returned an error
    Failed,
    /// Job was not run because a dependency did not succeed
    Skipped,
}

impl JobStatus {
    /// Check if the job has settled for the current run
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of jobs in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    /// Count for a single status
    pub fn get(&self, status: JobStatus) -> usize {
        match status {
            JobStatus::Pending => self.pending,
            JobStatus::Running => self.running,
            JobStatus::Success => self.success,
            JobStatus::Failed => self.failed,
            JobStatus::Skipped => self.skipped,
        }
    }

    pub fn record(&mut self, status: JobStatus) {
        let slot = match status {
            JobStatus::Pending => &mut self.pending,
            JobStatus::Running => &mut self.running,
            JobStatus::Success => &mut self.success,
            JobStatus::Failed => &mut self.failed,
            JobStatus::Skipped => &mut self.skipped,
        };
        *slot += 1;
    }
}

/// Per-job entry of a status summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub status: JobStatus,
    /// Duration in seconds, if the job ran to an outcome
    pub duration: Option<f64>,
    pub error: Option<String>,
}

/// Status report for a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Pipeline name
    pub pipeline: String,

    /// Total number of jobs
    pub total_jobs: usize,

    /// Number of jobs per status
    pub status_counts: StatusCounts,

    /// Sum of all recorded job durations, in seconds
    pub total_duration: f64,

    /// Per-job breakdown, in insertion order
    pub jobs: IndexMap<String, JobSummary>,
}

impl StatusSummary {
    /// True when no job failed and none was skipped or left pending
    pub fn is_success(&self) -> bool {
        self.status_counts.success == self.total_jobs
    }

    /// Names of the jobs that ended in `status`
    pub fn jobs_with_status(&self, status: JobStatus) -> Vec<&str> {
        self.jobs
            .iter()
            .filter(|(_, job)| job.status == status)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
