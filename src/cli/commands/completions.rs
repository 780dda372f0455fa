//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::generate;
use std::io;

use crate::cli::args::{Cli, CompletionsArgs};

/// Write completions for the requested shell to stdout.
pub fn generate_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
}
