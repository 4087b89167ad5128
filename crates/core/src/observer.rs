//! The seam between the chat core and whatever presents its state.

use crate::connection::ConnectionState;

/// Receives every externally observable change made by a [`crate::ChatSession`].
///
/// Calls happen synchronously, in the order the changes occur, on the task
/// that owns the session. Implementations must not block.
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send {
    /// The connection moved to `state`.
    fn connection_changed(&mut self, state: ConnectionState);

    /// A new turn was handed to the socket. The response has been reset and
    /// everything streamed from now on belongs to this turn.
    fn turn_started(&mut self);

    /// The current response now reads `text`; `complete` is set once the
    /// backend has signalled the end of the turn.
    fn response_changed(&mut self, text: &str, complete: bool);

    /// The backend raised the out-of-band trigger.
    fn triggered(&mut self);
}

/// An observer that ignores everything. Useful for headless sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn connection_changed(&mut self, _state: ConnectionState) {}
    fn turn_started(&mut self) {}
    fn response_changed(&mut self, _text: &str, _complete: bool) {}
    fn triggered(&mut self) {}
}
