//! Shell command execution.

pub mod command;

pub use command::{
    execute, execute_cancellable, spawn_background, BackgroundProcess, CommandOptions,
    CommandResult,
};
