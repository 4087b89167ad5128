//! Client-side core of a streaming chat connection.
//!
//! Everything here is free of I/O. A [`ChatSession`] consumes consumer
//! requests and socket events and answers with [`Command`]s that a runtime
//! (see the `chatstream-client` crate) executes against a real socket.

pub mod aggregator;
pub mod chat;
pub mod connection;
pub mod dispatcher;
pub mod observer;
pub mod protocol;
pub mod queue;
pub mod session;

pub use chat::ChatSession;
pub use connection::{ConnectionState, RetryPolicy, SocketEvent};
pub use observer::{NoopObserver, SessionObserver};
pub use session::SessionId;

use std::time::Duration;

/// Represents side effects the core asks its runtime to perform.
///
/// Commands must be executed in the order they are returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new socket to the backend.
    Connect,
    /// Write one text frame to the open socket.
    Transmit(String),
    /// Call [`ChatSession::retry_elapsed`] after the given delay.
    ScheduleReconnect(Duration),
    /// Drop the pending reconnection timer.
    CancelReconnect,
    /// Close the socket, or abandon the connection attempt in flight.
    Close,
}
