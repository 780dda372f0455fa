//! Service-readiness gating.
//!
//! Before a job's steps run, every declared endpoint must accept a TCP
//! connection. The gate polls each endpoint at a fixed interval until it
//! becomes reachable or its wall-clock budget expires. Reachability alone
//! satisfies the gate; any partial I/O on the probe connection is
//! irrelevant. No state is retained between calls.

use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use crate::cancel::CancelToken;
use crate::gate::endpoint::Endpoint;

/// Default pause between connection attempts. Sub-second so a service
/// becoming ready adds little latency, without spinning the CPU.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound for one connection attempt, so a black-holed endpoint
/// cannot stall the poll loop far past its budget.
const CONNECT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// One readiness requirement: an endpoint and a wait budget.
#[derive(Debug, Clone)]
pub struct ReadinessRequirement {
    pub endpoint: Endpoint,
    pub timeout: Duration,
}

impl ReadinessRequirement {
    /// Create a requirement. The timeout must be positive; zero budgets
    /// are rejected at config validation.
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }
}

/// Why a readiness wait did not succeed.
#[derive(Debug, Error)]
pub enum GateError {
    /// The endpoint never became reachable within its budget.
    #[error("timed out waiting for {endpoint} after {elapsed:.1?} (budget {timeout:.1?})")]
    TimedOut {
        endpoint: Endpoint,
        elapsed: Duration,
        timeout: Duration,
    },

    /// The workflow was cancelled while waiting.
    #[error("readiness wait for {endpoint} cancelled")]
    Cancelled { endpoint: Endpoint },
}

/// Polls endpoints for reachability within a bounded time budget.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    poll_interval: Duration,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    /// Create a gate with the default polling interval.
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create a gate with a custom polling interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Block until the requirement's endpoint accepts a TCP connection,
    /// returning the elapsed wait. Fails once elapsed wall-clock time
    /// exceeds the requirement's budget, or when `cancel` fires.
    pub fn await_ready(
        &self,
        requirement: &ReadinessRequirement,
        cancel: &CancelToken,
    ) -> Result<Duration, GateError> {
        let start = Instant::now();
        debug!(endpoint = %requirement.endpoint, budget = ?requirement.timeout, "waiting for service");

        loop {
            if cancel.is_cancelled() {
                return Err(GateError::Cancelled {
                    endpoint: requirement.endpoint.clone(),
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= requirement.timeout {
                return Err(GateError::TimedOut {
                    endpoint: requirement.endpoint.clone(),
                    elapsed,
                    timeout: requirement.timeout,
                });
            }

            let attempt_budget = CONNECT_ATTEMPT_TIMEOUT.min(requirement.timeout - elapsed);
            if probe(&requirement.endpoint, attempt_budget) {
                let elapsed = start.elapsed();
                debug!(endpoint = %requirement.endpoint, waited = ?elapsed, "service reachable");
                return Ok(elapsed);
            }
            trace!(endpoint = %requirement.endpoint, "probe failed, retrying");

            let elapsed = start.elapsed();
            if elapsed >= requirement.timeout {
                return Err(GateError::TimedOut {
                    endpoint: requirement.endpoint.clone(),
                    elapsed,
                    timeout: requirement.timeout,
                });
            }
            thread::sleep(self.poll_interval.min(requirement.timeout - elapsed));
        }
    }

    /// Await every requirement. All must succeed (logical AND); ordering
    /// between requirements carries no meaning, so they are polled on
    /// separate threads and the total wait is bounded by the largest
    /// budget rather than the sum. On failure, the error for the
    /// earliest-declared failing requirement is returned.
    pub fn await_all(
        &self,
        requirements: &[ReadinessRequirement],
        cancel: &CancelToken,
    ) -> Result<(), GateError> {
        match requirements {
            [] => Ok(()),
            [single] => self.await_ready(single, cancel).map(|_| ()),
            many => thread::scope(|scope| {
                let handles: Vec<_> = many
                    .iter()
                    .map(|requirement| scope.spawn(move || self.await_ready(requirement, cancel)))
                    .collect();

                let mut first_failure = None;
                for handle in handles {
                    match handle.join() {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => {
                            if first_failure.is_none() {
                                first_failure = Some(e);
                            }
                        }
                        // A poll thread cannot panic in practice; treat it
                        // as a cancellation-grade failure if it does.
                        Err(_) => {
                            if first_failure.is_none() {
                                first_failure = Some(GateError::Cancelled {
                                    endpoint: Endpoint::new("unknown", 0),
                                });
                            }
                        }
                    }
                }

                match first_failure {
                    None => Ok(()),
                    Some(e) => Err(e),
                }
            }),
        }
    }
}

/// One connection attempt. True as soon as any resolved address accepts.
fn probe(endpoint: &Endpoint, budget: Duration) -> bool {
    let addrs = match endpoint.authority().to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(_) => return false,
    };

    for addr in addrs {
        if TcpStream::connect_timeout(&addr, budget).is_ok() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    /// Bind an ephemeral listener and return it with its port.
    fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    /// A port that was just released and is therefore almost certainly closed.
    fn closed_port() -> u16 {
        let (listener, port) = listener();
        drop(listener);
        port
    }

    fn requirement(port: u16, timeout: Duration) -> ReadinessRequirement {
        ReadinessRequirement::new(Endpoint::new("127.0.0.1", port), timeout)
    }

    #[test]
    fn succeeds_immediately_when_listening() {
        let (_listener, port) = listener();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(10));

        let waited = gate
            .await_ready(&requirement(port, Duration::from_secs(5)), &CancelToken::new())
            .unwrap();
        assert!(waited < Duration::from_secs(1));
    }

    #[test]
    fn succeeds_when_endpoint_comes_up_late() {
        let (listener, port) = listener();
        drop(listener);

        let opener = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            TcpListener::bind(("127.0.0.1", port)).unwrap()
        });

        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(25));
        let result = gate.await_ready(&requirement(port, Duration::from_secs(10)), &CancelToken::new());
        let _keep_alive = opener.join().unwrap();

        assert!(result.is_ok());
    }

    #[test]
    fn times_out_within_one_interval_of_budget() {
        let port = closed_port();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(50));
        let budget = Duration::from_millis(300);

        let start = Instant::now();
        let err = gate
            .await_ready(&requirement(port, budget), &CancelToken::new())
            .unwrap_err();
        let elapsed = start.elapsed();

        match &err {
            GateError::TimedOut { endpoint, .. } => {
                assert_eq!(endpoint.port, port);
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
        assert!(elapsed >= budget, "returned before budget: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "overshot budget: {:?}", elapsed);
    }

    #[test]
    fn timeout_error_names_endpoint_and_elapsed() {
        let port = closed_port();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(20));

        let err = gate
            .await_ready(&requirement(port, Duration::from_millis(100)), &CancelToken::new())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(&format!("127.0.0.1:{}", port)), "message: {}", msg);
        assert!(msg.contains("timed out"), "message: {}", msg);
    }

    #[test]
    fn cancellation_aborts_the_wait() {
        let port = closed_port();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(25));
        let cancel = CancelToken::new();

        let killer = {
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                cancel.cancel();
            })
        };

        let start = Instant::now();
        let err = gate
            .await_ready(&requirement(port, Duration::from_secs(30)), &cancel)
            .unwrap_err();
        killer.join().unwrap();

        assert!(matches!(err, GateError::Cancelled { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn await_all_with_no_requirements_returns_immediately() {
        let gate = ReadinessGate::new();
        assert!(gate.await_all(&[], &CancelToken::new()).is_ok());
    }

    #[test]
    fn await_all_requires_every_endpoint() {
        let (_listener, open_port) = listener();
        let port = closed_port();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(25));

        let requirements = vec![
            requirement(open_port, Duration::from_secs(5)),
            requirement(port, Duration::from_millis(200)),
        ];

        let err = gate.await_all(&requirements, &CancelToken::new()).unwrap_err();
        match err {
            GateError::TimedOut { endpoint, .. } => assert_eq!(endpoint.port, port),
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[test]
    fn await_all_waits_are_bounded_by_the_largest_budget() {
        let first = closed_port();
        let second = closed_port();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(25));

        let requirements = vec![
            requirement(first, Duration::from_millis(300)),
            requirement(second, Duration::from_millis(300)),
        ];

        let start = Instant::now();
        let result = gate.await_all(&requirements, &CancelToken::new());
        let elapsed = start.elapsed();

        assert!(result.is_err());
        // Parallel waits: well under the 600ms a sequential sum would take,
        // with headroom for slow CI machines.
        assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    }

    #[test]
    fn await_all_succeeds_when_everything_listens() {
        let (_a, port_a) = listener();
        let (_b, port_b) = listener();
        let gate = ReadinessGate::with_poll_interval(Duration::from_millis(25));

        let requirements = vec![
            requirement(port_a, Duration::from_secs(5)),
            requirement(port_b, Duration::from_secs(5)),
        ];

        assert!(gate.await_all(&requirements, &CancelToken::new()).is_ok());
    }
}
