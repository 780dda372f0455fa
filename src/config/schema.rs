//! Configuration schema definitions for cairn.
//!
//! This module contains all the struct definitions that map to
//! the YAML pipeline file format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure for cairn.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pipeline name (for display purposes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Named constants available for `${var}` interpolation
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub vars: HashMap<String, String>,

    /// Workflow-wide environment variables
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Auxiliary service definitions, referenced by jobs
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub services: HashMap<String, ServiceConfig>,

    /// Job definitions
    pub jobs: HashMap<String, JobConfig>,

    /// The workflow: which jobs run, in declared order
    pub workflow: WorkflowConfig,

    /// Global settings
    pub settings: Settings,
}

/// Global settings that apply to the whole workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run jobs concurrently (one worker per job)
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub parallel: bool,

    /// Readiness polling interval in milliseconds
    #[serde(
        default = "default_poll_interval_ms",
        skip_serializing_if = "is_default_poll_interval"
    )]
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallel: default_true(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// An auxiliary service a job depends on. The image and optional start
/// command are opaque to the core: they are handed to the provisioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Container image identifier
    pub image: String,

    /// Startup command override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Environment passed to the service container
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Configuration for a single job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Execution image/environment identifier (opaque, display only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Names of auxiliary services this job depends on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,

    /// Endpoints that must be reachable before steps run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wait_for: Vec<WaitForConfig>,

    /// Job-level environment variables (overlaid on the global env)
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Ordered steps
    pub steps: Vec<StepConfig>,
}

/// One readiness requirement: a TCP endpoint and a wait budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitForConfig {
    pub host: String,
    pub port: u16,

    /// Wait budget in seconds
    #[serde(default = "default_wait_timeout", skip_serializing_if = "is_default_wait_timeout")]
    pub timeout: u64,
}

/// Configuration for a single step within a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Display name (defaults to the command)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Shell command to execute
    pub run: String,

    /// Step-specific environment overrides (win over job env on conflict)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Spawn without waiting; the process is reaped at job end
    #[serde(default, skip_serializing_if = "is_false")]
    pub background: bool,
}

/// The workflow definition: an ordered list of job names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub jobs: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !v
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn is_default_poll_interval(v: &u64) -> bool {
    *v == default_poll_interval_ms()
}

fn default_wait_timeout() -> u64 {
    60
}

fn is_default_wait_timeout(v: &u64) -> bool {
    *v == default_wait_timeout()
}
