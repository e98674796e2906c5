//! Generation Job Tracking
//!
//! Tracks one enqueued generation job from submission to its terminal
//! status.
//!
//! # Design Philosophy
//!
//! Job polls are fire-and-forget, so several may be in flight at once and
//! more than one can come back terminal. [`GenerationPoller`] is the single
//! place that decides whether a poll response produces an outcome, and it
//! produces at most one per job.

use crate::backend::{JobHandle, JobStatus, JobStatusReport};
use crate::error::BackendError;

/// A submitted generation job
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationJob {
    /// Handle used to poll the job
    pub handle: JobHandle,
    /// Last known status
    pub status: JobStatus,
    /// Result id once completed
    pub result_id: Option<String>,
    /// Error once failed
    pub error: Option<String>,
}

impl GenerationJob {
    fn new(handle: JobHandle) -> Self {
        Self {
            handle,
            status: JobStatus::Processing,
            result_id: None,
            error: None,
        }
    }
}

/// Terminal outcome of a job, delivered exactly once
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// The track is ready
    Completed {
        /// Result id to fetch or stream
        result_id: String,
    },
    /// The job cannot produce a track
    Failed {
        /// Text for the user
        error: String,
    },
}

/// Exactly-once outcome tracker for an enqueued job
#[derive(Debug, Default)]
pub struct GenerationPoller {
    job: Option<GenerationJob>,
    polls: u32,
}

impl GenerationPoller {
    /// Idle poller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly enqueued job, replacing any previous one
    pub fn begin(&mut self, handle: JobHandle) {
        tracing::debug!(job_id = ?handle.id(), "Tracking generation job");
        self.job = Some(GenerationJob::new(handle));
        self.polls = 0;
    }

    /// The tracked job
    #[must_use]
    pub fn job(&self) -> Option<&GenerationJob> {
        self.job.as_ref()
    }

    /// Poll responses applied to the current job
    #[must_use]
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// A job is tracked and has not reached a terminal status
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.job.as_ref().is_some_and(|job| !job.status.is_terminal())
    }

    /// The tracked job reached a terminal status
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.job.as_ref().is_some_and(|job| job.status.is_terminal())
    }

    /// Apply a status poll; returns the outcome on the first terminal report
    pub fn apply_report(&mut self, report: JobStatusReport) -> Option<JobOutcome> {
        if !self.is_active() {
            return None;
        }
        self.polls += 1;

        match report.status {
            JobStatus::Queued | JobStatus::Processing => {
                if let Some(job) = self.job.as_mut() {
                    job.status = report.status;
                }
                None
            }
            JobStatus::Completed => match report.result_id {
                Some(result_id) => Some(self.settle_completed(result_id)),
                None => Some(self.settle_failed(
                    "Generation finished without a result".to_string(),
                )),
            },
            JobStatus::Failed => {
                let error = report
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Music generation failed".to_string());
                Some(self.settle_failed(error))
            }
        }
    }

    /// Apply a failed poll request
    ///
    /// A job whose status cannot be read is given up on rather than polled
    /// forever.
    pub fn apply_poll_error(&mut self, error: &BackendError) -> Option<JobOutcome> {
        if !self.is_active() {
            return None;
        }
        self.polls += 1;
        Some(self.settle_failed(format!("Failed to check generation status: {error}")))
    }

    /// Stop tracking without producing an outcome
    pub fn cancel(&mut self) {
        self.job = None;
        self.polls = 0;
    }

    fn settle_completed(&mut self, result_id: String) -> JobOutcome {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Completed;
            job.result_id = Some(result_id.clone());
        }
        JobOutcome::Completed { result_id }
    }

    fn settle_failed(&mut self, error: String) -> JobOutcome {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Failed;
            job.error = Some(error.clone());
        }
        JobOutcome::Failed { error }
    }
}
