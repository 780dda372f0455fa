//! Service-readiness gating: endpoints and the TCP polling gate.

pub mod endpoint;
pub mod readiness;

pub use endpoint::Endpoint;
pub use readiness::{GateError, ReadinessGate, ReadinessRequirement, DEFAULT_POLL_INTERVAL};
