//! Command-line interface: argument parsing and command dispatch.

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, CompletionsArgs, ListArgs, RunArgs};
pub use commands::dispatcher::{Command, CommandDispatcher, CommandResult};
