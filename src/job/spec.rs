//! Resolved job specifications.
//!
//! Configuration structs are resolved once at startup into immutable value
//! structs: interpolation applied, service references expanded, readiness
//! budgets converted to durations. The runner only ever reads these.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::interpolation::{resolve_env, resolve_string, InterpolationContext};
use crate::config::schema::{JobConfig, PipelineConfig};
use crate::error::{CairnError, Result};
use crate::gate::{Endpoint, ReadinessRequirement};

/// An auxiliary service a job depends on, ready to hand to a provisioner.
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub name: String,
    pub image: String,
    pub command: Option<String>,
    pub env: HashMap<String, String>,
}

/// One resolved step: a non-empty command, env overrides, and whether it
/// runs in the background.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    pub name: String,
    pub command: String,
    pub env: HashMap<String, String>,
    pub background: bool,
}

/// A fully resolved job. Immutable once built.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub image: Option<String>,
    pub services: Vec<ServiceSpec>,
    pub readiness: Vec<ReadinessRequirement>,
    pub steps: Vec<ResolvedStep>,
    /// Shared environment: workflow env overlaid by job env.
    pub env: HashMap<String, String>,
}

impl JobSpec {
    /// Resolve one job from configuration.
    pub fn from_config(
        name: &str,
        job: &JobConfig,
        config: &PipelineConfig,
        ctx: &InterpolationContext,
    ) -> Result<Self> {
        let mut env = resolve_env(&config.env, ctx)?;
        env.extend(resolve_env(&job.env, ctx)?);

        let mut services = Vec::with_capacity(job.services.len());
        for service_name in &job.services {
            let service = config.services.get(service_name).ok_or_else(|| {
                CairnError::ConfigValidationError {
                    message: format!(
                        "Job '{}' references service '{}' which is not defined",
                        name, service_name
                    ),
                }
            })?;
            services.push(ServiceSpec {
                name: service_name.clone(),
                image: resolve_string(&service.image, ctx)?,
                command: service
                    .command
                    .as_deref()
                    .map(|c| resolve_string(c, ctx))
                    .transpose()?,
                env: resolve_env(&service.env, ctx)?,
            });
        }

        let mut readiness = Vec::with_capacity(job.wait_for.len());
        for wait in &job.wait_for {
            readiness.push(ReadinessRequirement::new(
                Endpoint::new(resolve_string(&wait.host, ctx)?, wait.port),
                Duration::from_secs(wait.timeout),
            ));
        }

        let mut steps = Vec::with_capacity(job.steps.len());
        for (index, step) in job.steps.iter().enumerate() {
            let command = resolve_string(&step.run, ctx)?;
            if command.trim().is_empty() {
                return Err(CairnError::ConfigValidationError {
                    message: format!("Job '{}' step {} has an empty command", name, index + 1),
                });
            }
            steps.push(ResolvedStep {
                name: step
                    .name
                    .clone()
                    .unwrap_or_else(|| command.clone()),
                command,
                env: resolve_env(&step.env, ctx)?,
                background: step.background,
            });
        }

        Ok(Self {
            name: name.to_string(),
            image: job.image.clone(),
            services,
            readiness,
            steps,
            env,
        })
    }

    /// Resolve every job the workflow declares, in declared order.
    pub fn resolve_all(config: &PipelineConfig, ctx: &InterpolationContext) -> Result<Vec<Self>> {
        config
            .workflow
            .jobs
            .iter()
            .map(|name| {
                let job = config
                    .jobs
                    .get(name)
                    .ok_or_else(|| CairnError::UnknownJob { name: name.clone() })?;
                Self::from_config(name, job, config, ctx)
            })
            .collect()
    }

    /// The environment a step runs with: shared job env overlaid by the
    /// step's overrides, step keys winning on conflict.
    pub fn step_env(&self, step: &ResolvedStep) -> HashMap<String, String> {
        let mut env = self.env.clone();
        env.extend(step.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        env
    }
}
