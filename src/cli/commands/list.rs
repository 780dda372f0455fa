//! List command implementation.
//!
//! The `cairn list` command shows the declared jobs with their services,
//! readiness gates, and steps.

use std::path::{Path, PathBuf};

use crate::cli::args::ListArgs;
use crate::error::{CairnError, Result};
use crate::ui::Output;

use super::dispatcher::{Command, CommandResult};

/// The list command implementation.
pub struct ListCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(project_root: &Path, config_path: Option<PathBuf>, args: ListArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path,
            args,
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let config = match super::load_pipeline(&self.project_root, self.config_path.as_deref()) {
            Ok(c) => c,
            Err(CairnError::ConfigNotFound { path }) => {
                out.error(&format!("No configuration found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        if self.args.json {
            let json = serde_json::to_string_pretty(&config).map_err(anyhow::Error::from)?;
            out.raw(&json);
            return Ok(CommandResult::success());
        }

        let theme = out.theme();

        if let Some(ref name) = config.name {
            out.message(&format!("{}", theme.header.apply_to(name)));
        }

        for job_name in &config.workflow.jobs {
            let Some(job) = config.jobs.get(job_name) else {
                out.message(&format!(
                    "{} {}",
                    theme.highlight.apply_to(job_name),
                    theme.error.apply_to("(undefined)")
                ));
                continue;
            };

            let image = job
                .image
                .as_deref()
                .map(|i| format!(" ({})", i))
                .unwrap_or_default();
            out.message(&format!(
                "{}{}",
                theme.highlight.apply_to(job_name),
                theme.dim.apply_to(&image)
            ));

            for service in &job.services {
                out.message(&format!("    service {}", service));
            }
            for wait in &job.wait_for {
                out.message(&format!(
                    "    wait for {}:{} ({}s)",
                    wait.host, wait.port, wait.timeout
                ));
            }
            for step in &job.steps {
                let suffix = if step.background { " (background)" } else { "" };
                out.message(&format!(
                    "    {}{}",
                    theme.command.apply_to(&step.run),
                    suffix
                ));
            }
        }

        Ok(CommandResult::success())
    }
}
