//! Auxiliary service provisioning.
//!
//! Starting and stopping service containers is delegated through the
//! [`Provisioner`] seam: the core only needs "start succeeded or not" and a
//! best-effort stop. The default implementation shells out to a container
//! runtime; tests substitute their own.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{CairnError, Result};
use crate::job::spec::ServiceSpec;
use crate::shell::{execute, CommandOptions};

/// Starts and stops a job's auxiliary services.
pub trait Provisioner: Send + Sync {
    /// Start a service for the given job. A failure is fatal to that job.
    fn start(&self, job: &str, service: &ServiceSpec) -> Result<()>;

    /// Stop a service, best-effort. Failures are logged, not surfaced.
    fn stop(&self, job: &str, service: &ServiceSpec);
}

/// Shells out to a container runtime (`docker` by default).
///
/// Containers are named `cairn-<job>-<service>` so a crashed run's leftovers
/// are replaced on the next start.
#[derive(Debug, Clone)]
pub struct ShellProvisioner {
    runtime: String,
}

impl Default for ShellProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellProvisioner {
    pub fn new() -> Self {
        Self::with_runtime("docker")
    }

    pub fn with_runtime(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    fn container_name(job: &str, service: &ServiceSpec) -> String {
        format!("cairn-{}-{}", job, service.name)
    }

    fn start_command(&self, job: &str, service: &ServiceSpec) -> String {
        let mut cmd = format!(
            "{} run -d --rm --network host --name {}",
            self.runtime,
            Self::container_name(job, service)
        );
        for (key, value) in sorted_env(&service.env) {
            cmd.push_str(&format!(" -e {}", shell_quote(&format!("{}={}", key, value))));
        }
        cmd.push(' ');
        cmd.push_str(&shell_quote(&service.image));
        if let Some(ref override_cmd) = service.command {
            cmd.push(' ');
            cmd.push_str(override_cmd);
        }
        cmd
    }
}

impl Provisioner for ShellProvisioner {
    fn start(&self, job: &str, service: &ServiceSpec) -> Result<()> {
        // Clear any leftover container from a previous, crashed run.
        self.stop(job, service);

        let command = self.start_command(job, service);
        debug!(job, service = %service.name, %command, "starting service");

        let result = execute(&command, &CommandOptions::default())?;
        if !result.success {
            return Err(CairnError::ProvisioningError {
                service: service.name.clone(),
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    fn stop(&self, job: &str, service: &ServiceSpec) {
        let command = format!(
            "{} rm -f {} 2>/dev/null",
            self.runtime,
            Self::container_name(job, service)
        );
        match execute(&command, &CommandOptions::default()) {
            Ok(_) => {}
            Err(e) => warn!(job, service = %service.name, "failed to stop service: {}", e),
        }
    }
}

/// Starts nothing. Used for dry runs and pipelines without services.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvisioner;

impl Provisioner for NullProvisioner {
    fn start(&self, _job: &str, _service: &ServiceSpec) -> Result<()> {
        Ok(())
    }

    fn stop(&self, _job: &str, _service: &ServiceSpec) {}
}

fn sorted_env(env: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut entries: Vec<_> = env.iter().collect();
    entries.sort_by_key(|(k, _)| k.as_str());
    entries
}

/// Single-quote a value for POSIX sh.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
