//! Cairn - service-readiness-gated CI workflow runner.
//!
//! Cairn runs a declarative workflow of independent CI jobs. Each job can
//! depend on auxiliary services; its steps are blocked until every declared
//! TCP endpoint is reachable, then executed strictly in order with
//! short-circuit failure. Outcomes are aggregated into a single
//! success/failure verdict that drives the process exit code.
//!
//! # Modules
//!
//! - [`cancel`] - Cooperative cancellation token
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Pipeline loading, interpolation, and validation
//! - [`error`] - Error types and result aliases
//! - [`gate`] - Service-readiness gating (TCP endpoint polling)
//! - [`job`] - Job specs, provisioning, execution, and outcomes
//! - [`shell`] - Shell command execution
//! - [`ui`] - Terminal output and theming
//! - [`workflow`] - Job scheduling and run reports
//!
//! # Example
//!
//! ```
//! use cairn::config::{resolve_string, InterpolationContext};
//!
//! // Version constants are substituted before anything executes.
//! let mut ctx = InterpolationContext::new();
//! ctx.vars.insert("PULSAR_VERSION".to_string(), "2.6.0".to_string());
//! let image = resolve_string("apachepulsar/pulsar:${PULSAR_VERSION}", &ctx).unwrap();
//! assert_eq!(image, "apachepulsar/pulsar:2.6.0");
//! ```

pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod job;
pub mod shell;
pub mod ui;
pub mod workflow;

pub use cancel::CancelToken;
pub use error::{CairnError, Result};
