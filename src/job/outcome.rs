//! Job outcomes.
//!
//! A [`JobOutcome`] is created once by the runner when a job finishes and
//! never mutated; the scheduler owns them for aggregation.

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Terminal status of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Every step completed successfully (vacuously true for zero steps).
    Passed,
    /// A step exited non-zero; later steps were not run.
    Failed,
    /// A readiness requirement was not met in budget; no step ran.
    TimedOut,
    /// Provisioning failure, cancellation, or infrastructure fault.
    Errored,
}

impl JobStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, JobStatus::Passed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Passed => "passed",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed out",
            JobStatus::Errored => "errored",
        };
        write!(f, "{}", s)
    }
}

/// The result of running one job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// Job name.
    pub job: String,

    /// Terminal status.
    pub status: JobStatus,

    /// Name of the step that failed, when status is Failed.
    pub failing_step: Option<String>,

    /// Exit code of the failing step, when known.
    pub exit_code: Option<i32>,

    /// Wall-clock duration of the whole job.
    #[serde(rename = "duration_ms", serialize_with = "duration_as_millis")]
    pub duration: Duration,

    /// Extra context: timed-out endpoint, provisioning error, stderr tail.
    pub detail: Option<String>,
}

fn duration_as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl JobOutcome {
    /// Every step completed.
    pub fn passed(job: &str, duration: Duration) -> Self {
        Self {
            job: job.to_string(),
            status: JobStatus::Passed,
            failing_step: None,
            exit_code: None,
            duration,
            detail: None,
        }
    }

    /// A step exited non-zero.
    pub fn failed(
        job: &str,
        failing_step: &str,
        exit_code: Option<i32>,
        duration: Duration,
        detail: Option<String>,
    ) -> Self {
        Self {
            job: job.to_string(),
            status: JobStatus::Failed,
            failing_step: Some(failing_step.to_string()),
            exit_code,
            duration,
            detail,
        }
    }

    /// A readiness gate expired before its endpoint accepted.
    pub fn timed_out(job: &str, detail: String, duration: Duration) -> Self {
        Self {
            job: job.to_string(),
            status: JobStatus::TimedOut,
            failing_step: None,
            exit_code: None,
            duration,
            detail: Some(detail),
        }
    }

    /// Provisioning failure, cancellation, or infrastructure fault.
    pub fn errored(job: &str, detail: String, duration: Duration) -> Self {
        Self {
            job: job.to_string(),
            status: JobStatus::Errored,
            failing_step: None,
            exit_code: None,
            duration,
            detail: Some(detail),
        }
    }

    /// One-line summary for the report.
    pub fn summary_line(&self) -> String {
        match self.status {
            JobStatus::Passed => format!("{} passed", self.job),
            JobStatus::Failed => {
                let step = self.failing_step.as_deref().unwrap_or("unknown step");
                match self.exit_code {
                    Some(code) => {
                        format!("{} failed: step '{}' exited with code {}", self.job, step, code)
                    }
                    None => format!("{} failed: step '{}' was killed", self.job, step),
                }
            }
            JobStatus::TimedOut => format!(
                "{} timed out: {}",
                self.job,
                self.detail.as_deref().unwrap_or("readiness wait expired")
            ),
            JobStatus::Errored => format!(
                "{} errored: {}",
                self.job,
                self.detail.as_deref().unwrap_or("infrastructure fault")
            ),
        }
    }
}
