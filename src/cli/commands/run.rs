//! Run command implementation.
//!
//! The `cairn run` command executes the declared workflow and exits 0 iff
//! every job passed.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::args::RunArgs;
use crate::config::{validate_config, InterpolationContext};
use crate::error::{CairnError, Result};
use crate::gate::ReadinessGate;
use crate::job::{JobSpec, NullProvisioner, Provisioner, ShellProvisioner};
use crate::ui::Output;
use crate::workflow::{RunReport, WorkflowScheduler};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project_root: &Path, config_path: Option<PathBuf>, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path,
            args,
        }
    }

    /// Restrict specs to `--only` jobs, keeping workflow order.
    fn apply_only_filter(&self, specs: Vec<JobSpec>) -> Result<Vec<JobSpec>> {
        if self.args.only.is_empty() {
            return Ok(specs);
        }

        for name in &self.args.only {
            if !specs.iter().any(|s| &s.name == name) {
                return Err(CairnError::UnknownJob { name: name.clone() });
            }
        }

        Ok(specs
            .into_iter()
            .filter(|s| self.args.only.contains(&s.name))
            .collect())
    }

    fn print_plan(&self, specs: &[JobSpec], out: &Output) {
        let theme = out.theme();
        out.message("Dry run - services will not be provisioned, steps will not be executed");
        for spec in specs {
            let image = spec
                .image
                .as_deref()
                .map(|i| format!(" ({})", i))
                .unwrap_or_default();
            out.message(&format!(
                "{}{}",
                theme.highlight.apply_to(&spec.name),
                theme.dim.apply_to(&image)
            ));
            for service in &spec.services {
                out.message(&format!(
                    "    service {} — {}",
                    service.name,
                    theme.dim.apply_to(&service.image)
                ));
            }
            for requirement in &spec.readiness {
                out.message(&format!(
                    "    wait for {} (up to {:?})",
                    requirement.endpoint, requirement.timeout
                ));
            }
            for step in &spec.steps {
                let suffix = if step.background { " (background)" } else { "" };
                out.message(&format!(
                    "    would run {}{}",
                    theme.command.apply_to(&step.command),
                    suffix
                ));
            }
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &Output) -> Result<CommandResult> {
        let config = match super::load_pipeline(&self.project_root, self.config_path.as_deref()) {
            Ok(c) => c,
            Err(CairnError::ConfigNotFound { path }) => {
                out.error(&format!("No configuration found at {}", path.display()));
                return Ok(CommandResult::failure(2));
            }
            Err(e) => return Err(e),
        };

        let errors = validate_config(&config);
        if !errors.is_empty() {
            for error in &errors {
                out.error(&error.message);
            }
            return Ok(CommandResult::failure(1));
        }

        let ctx = InterpolationContext::from_vars(config.vars.clone());
        let specs = self.apply_only_filter(JobSpec::resolve_all(&config, &ctx)?)?;

        if let Some(ref name) = config.name {
            out.message(&format!(
                "{}",
                out.theme()
                    .header
                    .apply_to(format!("Pipeline {} — {} jobs", name, specs.len()))
            ));
        } else {
            out.message(&format!(
                "{}",
                out.theme()
                    .header
                    .apply_to(format!("Running {} jobs", specs.len()))
            ));
        }

        if self.args.dry_run {
            self.print_plan(&specs, out);
            return Ok(CommandResult::success());
        }

        let shell_provisioner;
        let provisioner: &dyn Provisioner =
            if specs.iter().all(|s| s.services.is_empty()) {
                &NullProvisioner
            } else {
                shell_provisioner = ShellProvisioner::with_runtime(self.args.runtime.as_str());
                &shell_provisioner
            };

        let gate = ReadinessGate::with_poll_interval(std::time::Duration::from_millis(
            config.settings.poll_interval_ms,
        ));
        let scheduler = WorkflowScheduler::new(provisioner)
            .with_parallel(config.settings.parallel && !self.args.sequential)
            .with_gate(gate);

        let started_at = Utc::now();
        let result = scheduler.run_all(&specs, &self.project_root);
        let report = RunReport::new(config.name.clone(), started_at, result);

        if self.args.json {
            out.raw(&report.to_json().map_err(anyhow::Error::from)?);
        } else {
            out.raw(&report.render(out.theme()));
        }

        if report.success {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn spec(name: &str) -> JobSpec {
        JobSpec {
            name: name.to_string(),
            image: None,
            services: vec![],
            readiness: vec![],
            steps: vec![],
            env: HashMap::new(),
        }
    }

    fn command_with_only(only: Vec<String>) -> RunCommand {
        RunCommand::new(
            Path::new("."),
            None,
            RunArgs {
                only,
                ..Default::default()
            },
        )
    }

    #[test]
    fn only_filter_keeps_workflow_order() {
        let cmd = command_with_only(vec!["c".to_string(), "a".to_string()]);
        let specs = vec![spec("a"), spec("b"), spec("c")];

        let filtered = cmd.apply_only_filter(specs).unwrap();
        let names: Vec<_> = filtered.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn only_filter_rejects_unknown_job() {
        let cmd = command_with_only(vec!["ghost".to_string()]);
        let err = cmd.apply_only_filter(vec![spec("a")]).unwrap_err();
        assert!(matches!(err, CairnError::UnknownJob { .. }));
    }

    #[test]
    fn empty_only_filter_keeps_everything() {
        let cmd = command_with_only(vec![]);
        let filtered = cmd.apply_only_filter(vec![spec("a"), spec("b")]).unwrap();
        assert_eq!(filtered.len(), 2);
    }
}
