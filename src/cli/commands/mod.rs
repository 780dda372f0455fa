//! CLI subcommand implementations.

pub mod check;
pub mod completions;
pub mod dispatcher;
pub mod list;
pub mod run;

use std::path::Path;

use crate::config::{load_config, load_project_config, PipelineConfig};
use crate::error::Result;

/// Load the pipeline: an explicit `--config` path wins over discovery.
pub(crate) fn load_pipeline(
    project_root: &Path,
    config_path: Option<&Path>,
) -> Result<PipelineConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => load_project_config(project_root),
    }
}
