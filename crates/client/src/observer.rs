//! Publishes session changes on `tokio::sync::watch` channels.

use chatstream_core::{ConnectionState, SessionObserver};
use serde::Serialize;
use tokio::sync::watch;

/// Snapshot of the reply to the current turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Incremented every time a new turn is sent. Zero until the first one.
    pub turn: u64,
    /// Everything streamed so far. May be partial.
    pub text: String,
    /// Set once the backend signals the end of the turn.
    pub complete: bool,
}

/// Receiving ends of the observable client state.
#[derive(Debug, Clone)]
pub struct Watchers {
    pub connection: watch::Receiver<ConnectionState>,
    pub response: watch::Receiver<Response>,
    pub trigger: watch::Receiver<bool>,
}

/// A [`SessionObserver`] that keeps the latest value of every observable
/// field in a watch channel.
#[derive(Debug)]
pub struct WatchObserver {
    connection: watch::Sender<ConnectionState>,
    response: watch::Sender<Response>,
    trigger: watch::Sender<bool>,
}

impl WatchObserver {
    pub fn new() -> (Self, Watchers) {
        let (connection, connection_rx) = watch::channel(ConnectionState::Disconnected);
        let (response, response_rx) = watch::channel(Response::default());
        let (trigger, trigger_rx) = watch::channel(false);
        (
            Self {
                connection,
                response,
                trigger,
            },
            Watchers {
                connection: connection_rx,
                response: response_rx,
                trigger: trigger_rx,
            },
        )
    }
}

impl SessionObserver for WatchObserver {
    fn connection_changed(&mut self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    fn turn_started(&mut self) {
        self.response.send_modify(|response| {
            response.turn += 1;
            response.text.clear();
            response.complete = false;
        });
    }

    fn response_changed(&mut self, text: &str, complete: bool) {
        self.response.send_modify(|response| {
            response.text.clear();
            response.text.push_str(text);
            response.complete = complete;
        });
    }

    fn triggered(&mut self) {
        // Latched: once raised it stays raised.
        self.trigger.send_replace(true);
    }
}
