//! Connection lifecycle and bounded reconnection.
//!
//! [`ConnectionManager`] is the only place [`ConnectionState`] and the retry
//! counter change. It performs no I/O: the runtime reports what the socket did
//! and the manager decides what happens next.

use serde::Serialize;
use std::{fmt, time::Duration};
use tracing::{info, warn};

/// Reconnection attempts allowed after consecutive failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Fixed wait before each reconnection attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Lifecycle of the single connection owned by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    /// The connectivity flag shown to users.
    pub fn is_online(self) -> bool {
        self == ConnectionState::Open
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// What the socket layer reports, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The connection attempt succeeded.
    Opened,
    /// One inbound frame, as raw bytes.
    Frame(Vec<u8>),
    /// The socket closed, or a connection attempt failed.
    Closed,
    /// A socket error. Informational only; a `Closed` follows if the socket dies.
    ErrorObserved(String),
}

/// How many times and how often to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Decision taken when the socket closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Reconnect after `delay`; this is retry number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// The retry budget is spent. The connection stays closed for good.
    Exhausted,
    /// The close did not apply to a live or pending connection.
    Ignored,
}

/// What a shutdown interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Teardown {
    /// A socket was open or being opened and must be closed.
    pub close_socket: bool,
    /// A reconnection timer was pending and must be cancelled.
    pub cancel_retry: bool,
}

/// The connection state machine.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    policy: RetryPolicy,
    retries: u32,
    retry_pending: bool,
    exhausted: bool,
    shut_down: bool,
}

impl ConnectionManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            policy,
            retries: 0,
            retry_pending: false,
            exhausted: false,
            shut_down: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Consecutive failures since the last successful open.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// True once the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn is_retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// Disconnected → Connecting, on client startup.
    pub fn start(&mut self) -> bool {
        if self.shut_down || self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Connecting → Open. Resets the retry counter.
    pub fn opened(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Open;
        self.retries = 0;
        true
    }

    /// Open or Connecting → Closed, scheduling a retry while budget remains.
    pub fn closed(&mut self) -> CloseOutcome {
        if !matches!(
            self.state,
            ConnectionState::Open | ConnectionState::Connecting
        ) {
            return CloseOutcome::Ignored;
        }
        self.state = ConnectionState::Closed;

        if self.retries < self.policy.max_retries {
            self.retries += 1;
            self.retry_pending = true;
            info!(
                attempt = self.retries,
                max_retries = self.policy.max_retries,
                delay_ms = self.policy.delay.as_millis() as u64,
                "Attempting to reconnect ({}/{}) after delay.",
                self.retries,
                self.policy.max_retries
            );
            CloseOutcome::Retry {
                attempt: self.retries,
                delay: self.policy.delay,
            }
        } else {
            self.exhausted = true;
            warn!(
                max_retries = self.policy.max_retries,
                "Max reconnection attempts reached. Stopping reconnection."
            );
            CloseOutcome::Exhausted
        }
    }

    /// Closed → Connecting, when the scheduled retry fires.
    pub fn retry_elapsed(&mut self) -> bool {
        if self.shut_down || !self.retry_pending || self.state != ConnectionState::Closed {
            return false;
        }
        self.retry_pending = false;
        self.state = ConnectionState::Connecting;
        true
    }

    /// Ends the lifecycle. Nothing reconnects afterwards.
    pub fn shutdown(&mut self) -> Teardown {
        if self.shut_down {
            return Teardown::default();
        }
        let teardown = Teardown {
            close_socket: matches!(
                self.state,
                ConnectionState::Open | ConnectionState::Connecting
            ),
            cancel_retry: self.retry_pending,
        };
        self.shut_down = true;
        self.retry_pending = false;
        self.state = ConnectionState::Disconnected;
        teardown
    }
}
