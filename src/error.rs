//! Error types for cairn operations.
//!
//! This module defines [`CairnError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `CairnError` for failures that need distinct handling (config,
//!   provisioning, command launch)
//! - Job-level failures (timeouts, failing steps) are *outcomes*, not errors:
//!   they are reported through `JobOutcome` and never abort sibling jobs
//! - Use `anyhow::Error` (via `CairnError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cairn operations.
#[derive(Debug, Error)]
pub enum CairnError {
    /// Pipeline configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Referenced job does not exist.
    #[error("Unknown job: {name}")]
    UnknownJob { name: String },

    /// An auxiliary service could not be started.
    #[error("Service '{service}' failed to start: {message}")]
    ProvisioningError { service: String, message: String },

    /// A step command could not be launched at all (shell missing, spawn failure).
    #[error("Failed to launch command: {command}")]
    CommandSpawnError { command: String },

    /// A command was interrupted by workflow cancellation.
    #[error("Command interrupted: {command}")]
    Interrupted { command: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for cairn operations.
pub type Result<T> = std::result::Result<T, CairnError>;
