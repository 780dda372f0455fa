//! Job execution.
//!
//! A [`JobRunner`] takes one immutable [`JobSpec`] to a terminal
//! [`JobOutcome`]: provision services, await readiness, run steps in order,
//! tear down. All failures are job-scoped; the runner never panics a
//! sibling job.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::CairnError;
use crate::gate::readiness::GateError;
use crate::gate::ReadinessGate;
use crate::job::outcome::JobOutcome;
use crate::job::provision::Provisioner;
use crate::job::spec::{JobSpec, ServiceSpec};
use crate::shell::{execute_cancellable, spawn_background, BackgroundProcess, CommandOptions};

/// How many trailing stderr lines a failed step contributes to its outcome.
const STDERR_TAIL_LINES: usize = 20;

/// Executes one job to completion.
pub struct JobRunner<'a> {
    provisioner: &'a dyn Provisioner,
    gate: ReadinessGate,
    cancel: CancelToken,
}

impl<'a> JobRunner<'a> {
    /// Create a runner with a default gate and a fresh cancel token.
    pub fn new(provisioner: &'a dyn Provisioner) -> Self {
        Self {
            provisioner,
            gate: ReadinessGate::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Use a specific readiness gate (custom polling interval).
    pub fn with_gate(mut self, gate: ReadinessGate) -> Self {
        self.gate = gate;
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the job: services, readiness gates, then steps strictly in order.
    ///
    /// - Provisioning failure → `Errored`, nothing else runs
    /// - First readiness timeout → `TimedOut`, zero steps execute
    /// - First failing step → `Failed` with the step and its exit code;
    ///   later steps are not invoked
    /// - Cancellation anywhere → `Errored`
    pub fn run(&self, job: &JobSpec, project_root: &Path) -> JobOutcome {
        let start = Instant::now();
        info!(job = %job.name, "starting job");

        let mut started: Vec<&ServiceSpec> = Vec::new();
        let mut background: Vec<BackgroundProcess> = Vec::new();

        for service in &job.services {
            if let Err(e) = self.provisioner.start(&job.name, service) {
                self.teardown(job, &started, &mut background);
                return JobOutcome::errored(&job.name, e.to_string(), start.elapsed());
            }
            started.push(service);
        }

        if let Err(e) = self.gate.await_all(&job.readiness, &self.cancel) {
            self.teardown(job, &started, &mut background);
            return match e {
                GateError::TimedOut { .. } => {
                    warn!(job = %job.name, "{}", e);
                    JobOutcome::timed_out(&job.name, e.to_string(), start.elapsed())
                }
                GateError::Cancelled { .. } => {
                    JobOutcome::errored(&job.name, e.to_string(), start.elapsed())
                }
            };
        }

        for step in &job.steps {
            if self.cancel.is_cancelled() {
                self.teardown(job, &started, &mut background);
                return JobOutcome::errored(
                    &job.name,
                    format!("cancelled before step '{}'", step.name),
                    start.elapsed(),
                );
            }

            let options = CommandOptions {
                cwd: Some(project_root.to_path_buf()),
                env: job.step_env(step),
            };

            if step.background {
                match spawn_background(&step.command, &options) {
                    Ok(process) => {
                        debug!(job = %job.name, step = %step.name, "spawned background step");
                        background.push(process);
                    }
                    Err(e) => {
                        self.teardown(job, &started, &mut background);
                        return JobOutcome::errored(&job.name, e.to_string(), start.elapsed());
                    }
                }
                continue;
            }

            debug!(job = %job.name, step = %step.name, "running step");
            match execute_cancellable(&step.command, &options, &self.cancel) {
                Ok(result) if result.success => {
                    debug!(job = %job.name, step = %step.name, duration = ?result.duration, "step passed");
                }
                Ok(result) => {
                    self.teardown(job, &started, &mut background);
                    return JobOutcome::failed(
                        &job.name,
                        &step.name,
                        result.exit_code,
                        start.elapsed(),
                        stderr_tail(&result.stderr),
                    );
                }
                Err(CairnError::Interrupted { .. }) => {
                    self.teardown(job, &started, &mut background);
                    return JobOutcome::errored(
                        &job.name,
                        format!("cancelled during step '{}'", step.name),
                        start.elapsed(),
                    );
                }
                Err(e) => {
                    self.teardown(job, &started, &mut background);
                    return JobOutcome::errored(&job.name, e.to_string(), start.elapsed());
                }
            }
        }

        self.teardown(job, &started, &mut background);
        info!(job = %job.name, duration = ?start.elapsed(), "job passed");
        JobOutcome::passed(&job.name, start.elapsed())
    }

    /// Reap background steps, then stop started services, best-effort.
    fn teardown(
        &self,
        job: &JobSpec,
        started: &[&ServiceSpec],
        background: &mut Vec<BackgroundProcess>,
    ) {
        for process in background.iter_mut() {
            if process.is_running() {
                debug!(job = %job.name, command = %process.command, "terminating background step");
            }
            process.terminate();
        }
        for service in started {
            self.provisioner.stop(&job.name, service);
        }
    }
}

/// The last few stderr lines of a failed step, for the report.
fn stderr_tail(stderr: &str) -> Option<String> {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    let tail = lines.len().saturating_sub(STDERR_TAIL_LINES);
    Some(lines[tail..].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::gate::{Endpoint, ReadinessRequirement};
    use crate::job::outcome::JobStatus;
    use crate::job::provision::NullProvisioner;
    use crate::job::spec::ResolvedStep;
    use std::collections::HashMap;
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn step(command: &str) -> ResolvedStep {
        ResolvedStep {
            name: command.to_string(),
            command: command.to_string(),
            env: HashMap::new(),
            background: false,
        }
    }

    fn job(name: &str, steps: Vec<ResolvedStep>) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            image: None,
            services: vec![],
            readiness: vec![],
            steps,
            env: HashMap::new(),
        }
    }

    fn fast_gate() -> ReadinessGate {
        ReadinessGate::with_poll_interval(Duration::from_millis(20))
    }

    #[test]
    fn zero_steps_is_vacuously_passed() {
        let temp = TempDir::new().unwrap();
        let runner = JobRunner::new(&NullProvisioner);

        let outcome = runner.run(&job("empty", vec![]), temp.path());
        assert_eq!(outcome.status, JobStatus::Passed);
    }

    #[test]
    fn all_steps_passing_is_passed() {
        let temp = TempDir::new().unwrap();
        let runner = JobRunner::new(&NullProvisioner);

        let spec = job("unit", vec![step("echo one"), step("echo two")]);
        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Passed);
        assert!(outcome.failing_step.is_none());
    }

    #[test]
    fn failing_step_short_circuits_later_steps() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("c-ran.txt");
        let runner = JobRunner::new(&NullProvisioner);

        let spec = job(
            "unit",
            vec![
                step("echo a"),
                step("exit 7"),
                step(&format!("touch {}", marker.display())),
            ],
        );
        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.failing_step.as_deref(), Some("exit 7"));
        assert_eq!(outcome.exit_code, Some(7));
        assert!(!marker.exists(), "step after the failure must not run");
    }

    #[test]
    fn failed_outcome_carries_stderr_tail() {
        let temp = TempDir::new().unwrap();
        let runner = JobRunner::new(&NullProvisioner);

        let spec = job("unit", vec![step("echo broken >&2; exit 1")]);
        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.detail.unwrap().contains("broken"));
    }

    #[test]
    fn steps_run_in_declaration_order() {
        let temp = TempDir::new().unwrap();
        let order_file = temp.path().join("order.txt");
        let runner = JobRunner::new(&NullProvisioner);

        let spec = job(
            "unit",
            vec![
                step(&format!("echo first >> {}", order_file.display())),
                step(&format!("echo second >> {}", order_file.display())),
            ],
        );
        let outcome = runner.run(&spec, temp.path());
        assert_eq!(outcome.status, JobStatus::Passed);

        let content = std::fs::read_to_string(&order_file).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn steps_receive_merged_env() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("env.txt");
        let runner = JobRunner::new(&NullProvisioner);

        let mut spec = job(
            "unit",
            vec![ResolvedStep {
                name: "env check".to_string(),
                command: format!("echo $SHARED-$OVERRIDE > {}", out.display()),
                env: HashMap::from([("OVERRIDE".to_string(), "step".to_string())]),
                background: false,
            }],
        );
        spec.env.insert("SHARED".to_string(), "job".to_string());
        spec.env.insert("OVERRIDE".to_string(), "job".to_string());

        let outcome = runner.run(&spec, temp.path());
        assert_eq!(outcome.status, JobStatus::Passed);

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.trim(), "job-step");
    }

    #[test]
    fn readiness_gate_clears_before_steps() {
        let temp = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let runner = JobRunner::new(&NullProvisioner).with_gate(fast_gate());
        let mut spec = job("integrate", vec![step("echo reached")]);
        spec.readiness.push(ReadinessRequirement::new(
            Endpoint::new("127.0.0.1", port),
            Duration::from_secs(5),
        ));

        let outcome = runner.run(&spec, temp.path());
        assert_eq!(outcome.status, JobStatus::Passed);
    }

    #[test]
    fn readiness_timeout_skips_all_steps() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("ran.txt");

        // Grab a port, then free it so nothing is listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let runner = JobRunner::new(&NullProvisioner).with_gate(fast_gate());
        let mut spec = job(
            "integrate",
            vec![step(&format!("touch {}", marker.display()))],
        );
        spec.readiness.push(ReadinessRequirement::new(
            Endpoint::new("127.0.0.1", port),
            Duration::from_millis(200),
        ));

        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::TimedOut);
        assert!(outcome.detail.unwrap().contains(&port.to_string()));
        assert!(!marker.exists(), "no step may run after a gate timeout");
    }

    #[test]
    fn background_step_does_not_block_job() {
        let temp = TempDir::new().unwrap();
        let runner = JobRunner::new(&NullProvisioner);

        let mut spec = job("example", vec![]);
        spec.steps.push(ResolvedStep {
            name: "worker".to_string(),
            command: "sleep 30".to_string(),
            env: HashMap::new(),
            background: true,
        });
        spec.steps.push(step("echo server"));

        let start = Instant::now();
        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Passed);
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "background step must not be awaited"
        );
    }

    #[test]
    fn cancellation_reports_errored() {
        let temp = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();

        let runner = JobRunner::new(&NullProvisioner).with_cancel(cancel);
        let outcome = runner.run(&job("unit", vec![step("echo hi")]), temp.path());

        assert_eq!(outcome.status, JobStatus::Errored);
    }

    /// Records provisioning calls; optionally fails a named service.
    struct RecordingProvisioner {
        started: Mutex<Vec<String>>,
        stopped: Mutex<Vec<String>>,
        fail: Option<String>,
    }

    impl RecordingProvisioner {
        fn new(fail: Option<&str>) -> Self {
            Self {
                started: Mutex::new(vec![]),
                stopped: Mutex::new(vec![]),
                fail: fail.map(str::to_string),
            }
        }
    }

    impl Provisioner for RecordingProvisioner {
        fn start(&self, _job: &str, service: &ServiceSpec) -> Result<()> {
            if self.fail.as_deref() == Some(service.name.as_str()) {
                return Err(CairnError::ProvisioningError {
                    service: service.name.clone(),
                    message: "image not found".to_string(),
                });
            }
            self.started.lock().unwrap().push(service.name.clone());
            Ok(())
        }

        fn stop(&self, _job: &str, service: &ServiceSpec) {
            self.stopped.lock().unwrap().push(service.name.clone());
        }
    }

    fn service(name: &str) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            image: format!("{}:latest", name),
            command: None,
            env: HashMap::new(),
        }
    }

    #[test]
    fn provisioning_failure_is_errored_and_skips_steps() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("ran.txt");
        let provisioner = RecordingProvisioner::new(Some("pulsar"));

        let runner = JobRunner::new(&provisioner);
        let mut spec = job(
            "integrate",
            vec![step(&format!("touch {}", marker.display()))],
        );
        spec.services.push(service("rabbitmq"));
        spec.services.push(service("pulsar"));

        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Errored);
        assert!(outcome.detail.unwrap().contains("pulsar"));
        assert!(!marker.exists());
        // The service that did start is stopped during teardown.
        assert_eq!(*provisioner.stopped.lock().unwrap(), vec!["rabbitmq"]);
    }

    #[test]
    fn services_are_stopped_after_a_passing_job() {
        let temp = TempDir::new().unwrap();
        let provisioner = RecordingProvisioner::new(None);

        let runner = JobRunner::new(&provisioner);
        let mut spec = job("integrate", vec![step("echo ok")]);
        spec.services.push(service("rabbitmq"));

        let outcome = runner.run(&spec, temp.path());

        assert_eq!(outcome.status, JobStatus::Passed);
        assert_eq!(*provisioner.started.lock().unwrap(), vec!["rabbitmq"]);
        assert_eq!(*provisioner.stopped.lock().unwrap(), vec!["rabbitmq"]);
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let many: String = (0..40).map(|i| format!("line-{}\n", i)).collect();
        let tail = stderr_tail(&many).unwrap();
        assert!(tail.contains("line-39"));
        assert!(!tail.contains("line-0\n"));
    }

    #[test]
    fn stderr_tail_of_empty_is_none() {
        assert!(stderr_tail("").is_none());
        assert!(stderr_tail("  \n ").is_none());
    }
}
