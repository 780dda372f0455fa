//! Check command implementation.
//!
//! The `cairn check` command validates the pipeline file and prints every
//! diagnostic, so users can fix all issues in one pass.

use std::path::{Path, PathBuf};

use crate::cli::args::CheckArgs;
use crate::config::validate_config;
use crate::error::{CairnError, Result};
use crate::ui::Output;

use super::dispatcher::{Command, CommandResult};

/// The check command implementation.
pub struct CheckCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    #[allow(dead_code)]
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(project_root: &Path, config_path: Option<PathBuf>, args: CheckArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path,
            args,
        }
    }
}

impl Command for CheckCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let config = match super::load_pipeline(&self.project_root, self.config_path.as_deref()) {
            Ok(c) => c,
            Err(CairnError::ConfigNotFound { path }) => {
                out.error(&format!("No configuration found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(CairnError::ConfigParseError { path, message }) => {
                out.error(&format!("{}: {}", path.display(), message));
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        let errors = validate_config(&config);
        if errors.is_empty() {
            out.message(&out.theme().format_success("Configuration OK"));
            return Ok(CommandResult::success());
        }

        for error in &errors {
            out.message(&format!(
                "{} {}",
                out.theme().format_error(&error.message),
                out.theme().dim.apply_to(format!("[{}]", error.rule))
            ));
        }
        out.message(&format!("{} problem(s) found", errors.len()));

        Ok(CommandResult::failure(1))
    }
}
