//! Workflow scheduling.
//!
//! Jobs declare no dependencies on each other, so the scheduler fans them
//! out one worker thread per job (or runs them sequentially when
//! configured). Outcomes are collected in declared order regardless of
//! completion order, keeping results deterministic and diffable.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::cancel::CancelToken;
use crate::gate::ReadinessGate;
use crate::job::provision::Provisioner;
use crate::job::runner::JobRunner;
use crate::job::spec::JobSpec;
use crate::job::outcome::{JobOutcome, JobStatus};

/// Aggregated result of one workflow run.
#[derive(Debug)]
pub struct WorkflowResult {
    /// One outcome per job, in declared order.
    pub outcomes: Vec<JobOutcome>,

    /// True iff every outcome passed. No partial-success notion.
    pub success: bool,

    /// Wall-clock duration of the whole run.
    pub duration: Duration,
}

/// Launches job runners and aggregates their outcomes.
///
/// One verdict per job per run; nothing is retried. Re-running is the
/// caller's responsibility.
pub struct WorkflowScheduler<'a> {
    provisioner: &'a dyn Provisioner,
    gate: ReadinessGate,
    cancel: CancelToken,
    parallel: bool,
}

impl<'a> WorkflowScheduler<'a> {
    /// Create a scheduler with parallel execution and a default gate.
    pub fn new(provisioner: &'a dyn Provisioner) -> Self {
        Self {
            provisioner,
            gate: ReadinessGate::new(),
            cancel: CancelToken::new(),
            parallel: true,
        }
    }

    /// Enable or disable parallel job execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use a specific readiness gate (custom polling interval).
    pub fn with_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    /// A handle the caller can use to cancel the run.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every job and aggregate. Failures are job-scoped: a failing,
    /// timed-out, or errored job never aborts its siblings, and every
    /// job's outcome is collected before the verdict.
    pub fn run_all(&self, jobs: &[JobSpec], project_root: &Path) -> WorkflowResult {
        let start = Instant::now();
        info!(jobs = jobs.len(), parallel = self.parallel, "starting workflow");

        let outcomes: Vec<JobOutcome> = if self.parallel && jobs.len() > 1 {
            thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .iter()
                    .map(|job| scope.spawn(move || self.runner().run(job, project_root)))
                    .collect();

                // Joining in spawn order preserves declared job order.
                handles
                    .into_iter()
                    .zip(jobs)
                    .map(|(handle, job)| {
                        handle.join().unwrap_or_else(|_| {
                            JobOutcome::errored(
                                &job.name,
                                "job worker panicked".to_string(),
                                start.elapsed(),
                            )
                        })
                    })
                    .collect()
            })
        } else {
            jobs.iter()
                .map(|job| self.runner().run(job, project_root))
                .collect()
        };

        let success = outcomes.iter().all(|o| o.status == JobStatus::Passed);
        WorkflowResult {
            outcomes,
            success,
            duration: start.elapsed(),
        }
    }

    fn runner(&self) -> JobRunner<'_> {
        JobRunner::new(self.provisioner)
            .with_gate(self.gate.clone())
            .with_cancel(self.cancel.clone())
    }
}
