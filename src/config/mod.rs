//! Pipeline configuration: schema, loading, interpolation, validation.

pub mod interpolation;
pub mod loader;
pub mod schema;
pub mod validator;

pub use interpolation::{resolve_env, resolve_string, InterpolationContext};
pub use loader::{find_config, load_config, load_project_config};
pub use schema::{
    JobConfig, PipelineConfig, ServiceConfig, Settings, StepConfig, WaitForConfig, WorkflowConfig,
};
pub use validator::{ensure_valid, validate_config, ValidationError};
