//! Pipeline validation rules.
//!
//! This module validates configuration for correctness:
//! - The workflow must list at least one job, each exactly once
//! - Workflow entries and job service references must exist
//! - Steps must have a non-empty command
//! - Readiness timeouts must be positive

use crate::config::schema::PipelineConfig;
use crate::error::{CairnError, Result};
use std::collections::HashSet;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Job name if error is job-specific
    pub job: Option<String>,
}

/// Validate a pipeline and return all errors.
///
/// Collects every violation rather than stopping at the first one,
/// so users can fix multiple issues at once.
pub fn validate_config(config: &PipelineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_workflow(config));
    errors.extend(validate_jobs(config));

    errors
}

/// Validate, turning any violation into a single `ConfigValidationError`.
pub fn ensure_valid(config: &PipelineConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    Err(CairnError::ConfigValidationError {
        message: messages.join("; "),
    })
}

fn validate_workflow(config: &PipelineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.workflow.jobs.is_empty() {
        errors.push(ValidationError {
            rule: "empty-workflow".to_string(),
            message: "Workflow declares no jobs".to_string(),
            job: None,
        });
    }

    let mut seen = HashSet::new();
    for name in &config.workflow.jobs {
        if !config.jobs.contains_key(name) {
            errors.push(ValidationError {
                rule: "unknown-job".to_string(),
                message: format!("Workflow references job '{}' which does not exist", name),
                job: Some(name.clone()),
            });
        }
        if !seen.insert(name) {
            errors.push(ValidationError {
                rule: "duplicate-job".to_string(),
                message: format!("Workflow lists job '{}' more than once", name),
                job: Some(name.clone()),
            });
        }
    }

    errors
}

fn validate_jobs(config: &PipelineConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, job) in &config.jobs {
        for service in &job.services {
            if !config.services.contains_key(service) {
                errors.push(ValidationError {
                    rule: "unknown-service".to_string(),
                    message: format!(
                        "Job '{}' references service '{}' which is not defined",
                        name, service
                    ),
                    job: Some(name.clone()),
                });
            }
        }

        for (index, step) in job.steps.iter().enumerate() {
            if step.run.trim().is_empty() {
                errors.push(ValidationError {
                    rule: "empty-command".to_string(),
                    message: format!("Job '{}' step {} has an empty command", name, index + 1),
                    job: Some(name.clone()),
                });
            }
        }

        for wait in &job.wait_for {
            if wait.timeout == 0 {
                errors.push(ValidationError {
                    rule: "zero-timeout".to_string(),
                    message: format!(
                        "Job '{}' readiness wait on {}:{} has a zero timeout",
                        name, wait.host, wait.port
                    ),
                    job: Some(name.clone()),
                });
            }
            if wait.host.trim().is_empty() {
                errors.push(ValidationError {
                    rule: "empty-host".to_string(),
                    message: format!("Job '{}' readiness wait has an empty host", name),
                    job: Some(name.clone()),
                });
            }
        }
    }

    errors
}
