//! Shell command execution.
//!
//! Steps are shell-style command strings. Foreground steps run through
//! [`execute`] (or [`execute_cancellable`] when a cancel token is in play);
//! background steps are spawned with [`spawn_background`] and reaped when
//! their job finishes.

use crate::cancel::CancelToken;
use crate::error::{CairnError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a cancellable wait polls the child process.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged over the inherited process env).
    pub env: HashMap<String, String>,
}

/// A step process left running in the background.
///
/// Dropping without [`terminate`](Self::terminate) leaks the process;
/// the job runner always reaps its background steps during teardown.
#[derive(Debug)]
pub struct BackgroundProcess {
    pub command: String,
    child: Child,
}

impl BackgroundProcess {
    /// Whether the process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Kill and reap the process, best-effort.
    pub fn terminate(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn build_command(command: &str, options: &CommandOptions) -> Command {
    // Pipeline commands assume POSIX sh semantics, so the user's login
    // shell is deliberately not consulted.
    let mut cmd = if cfg!(target_os = "windows") {
        let shell = std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string());
        let mut cmd = Command::new(shell);
        cmd.arg("/C");
        cmd
    } else {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c");
        cmd
    };
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd
}

/// Execute a shell command to completion, capturing output.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = build_command(command, options);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = cmd.output().map_err(|_| CairnError::CommandSpawnError {
        command: command.to_string(),
    })?;

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration: start.elapsed(),
        success: output.status.success(),
    })
}

/// Execute a shell command, aborting early if the token fires.
///
/// The child is spawned rather than waited on directly: output is drained
/// on reader threads while the main thread polls `try_wait`, so a cancel
/// can kill the process mid-run. Cancellation returns
/// [`CairnError::Interrupted`].
pub fn execute_cancellable(
    command: &str,
    options: &CommandOptions,
    cancel: &CancelToken,
) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = build_command(command, options);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|_| CairnError::CommandSpawnError {
        command: command.to_string(),
    })?;

    // Drain pipes on separate threads so a chatty child can't fill the
    // pipe buffer and deadlock against our polling loop.
    let stdout_handle = child.stdout.take().map(|pipe| spawn_reader(pipe));
    let stderr_handle = child.stderr.take().map(|pipe| spawn_reader(pipe));

    let status = loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CairnError::Interrupted {
                command: command.to_string(),
            });
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(WAIT_POLL_INTERVAL),
            Err(e) => return Err(CairnError::Io(e)),
        }
    };

    let stdout = join_reader(stdout_handle);
    let stderr = join_reader(stderr_handle);

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration: start.elapsed(),
        success: status.success(),
    })
}

/// Spawn a shell command without waiting for it.
pub fn spawn_background(command: &str, options: &CommandOptions) -> Result<BackgroundProcess> {
    let mut cmd = build_command(command, options);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let child = cmd.spawn().map_err(|_| CairnError::CommandSpawnError {
        command: command.to_string(),
    })?;

    Ok(BackgroundProcess {
        command: command.to_string(),
        child,
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let reader = BufReader::new(pipe);
        let mut output = String::new();
        for line in reader.lines().map_while(std::result::Result::ok) {
            output.push_str(&line);
            output.push('\n');
        }
        output
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::default()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 3", &CommandOptions::default()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::default();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let cmd = if cfg!(target_os = "windows") {
            "echo %MY_VAR%"
        } else {
            "echo $MY_VAR"
        };

        let result = execute(cmd, &options).unwrap();
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let result = execute("pwd", &options).unwrap();
        assert!(result.success);
    }

    #[test]
    fn execute_captures_stderr() {
        let result = execute("echo oops >&2", &CommandOptions::default()).unwrap();
        assert!(result.stderr.contains("oops"));
    }

    #[test]
    fn cancellable_runs_to_completion_without_cancel() {
        let result =
            execute_cancellable("echo done", &CommandOptions::default(), &CancelToken::new())
                .unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("done"));
    }

    #[test]
    fn cancellable_captures_large_output() {
        // More than a pipe buffer's worth; must not deadlock.
        let result = execute_cancellable(
            "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done",
            &CommandOptions::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("line-19999"));
    }

    #[test]
    fn cancellable_kills_on_cancel() {
        let cancel = CancelToken::new();
        let killer = {
            let cancel = cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                cancel.cancel();
            })
        };

        let start = Instant::now();
        let err =
            execute_cancellable("sleep 30", &CommandOptions::default(), &cancel).unwrap_err();
        killer.join().unwrap();

        assert!(matches!(err, CairnError::Interrupted { .. }));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn background_process_runs_and_terminates() {
        let mut process =
            spawn_background("sleep 30", &CommandOptions::default()).unwrap();
        assert!(process.is_running());

        process.terminate();
        assert!(!process.is_running());
    }

    #[test]
    fn background_process_observes_exit() {
        let mut process = spawn_background("true", &CommandOptions::default()).unwrap();
        // Give the process a moment to exit.
        thread::sleep(Duration::from_millis(200));
        assert!(!process.is_running());
        process.terminate();
    }
}
