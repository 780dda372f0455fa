//! Pipeline file discovery and loading.

use crate::config::schema::PipelineConfig;
use crate::error::{CairnError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Candidate pipeline file locations, relative to the project root,
/// in lookup order.
const CONFIG_LOCATIONS: &[&str] = &["cairn.yml", "cairn.yaml", ".cairn/pipeline.yml"];

/// Find the pipeline file for the given project root.
pub fn find_config(project_root: &Path) -> Option<PathBuf> {
    CONFIG_LOCATIONS
        .iter()
        .map(|rel| project_root.join(rel))
        .find(|p| p.is_file())
}

/// Load and parse a single pipeline file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CairnError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            CairnError::Io(e)
        }
    })?;

    serde_yaml::from_str(&content).map_err(|e| CairnError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Discover and load the pipeline for a project root.
pub fn load_project_config(project_root: &Path) -> Result<PipelineConfig> {
    match find_config(project_root) {
        Some(path) => load_config(&path),
        None => Err(CairnError::ConfigNotFound {
            path: project_root.join(CONFIG_LOCATIONS[0]),
        }),
    }
}
