//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Cairn - service-readiness-gated CI workflow runner.
#[derive(Debug, Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to pipeline file (overrides default cairn.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the workflow (default if no command specified)
    Run(RunArgs),

    /// List declared jobs, services, and readiness gates
    List(ListArgs),

    /// Validate the pipeline file
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Run only specified jobs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Print the plan without provisioning services or executing steps
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Run jobs one at a time even if the pipeline enables parallelism
    #[arg(long)]
    pub sequential: bool,

    /// Container runtime for auxiliary services
    #[arg(long, env = "CAIRN_RUNTIME", default_value = "docker")]
    pub runtime: String,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            dry_run: false,
            json: false,
            sequential: false,
            runtime: "docker".to_string(),
        }
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
