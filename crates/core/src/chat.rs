//! One conversation: identity, queue, stream state and connection lifecycle.

use crate::{
    Command,
    aggregator::StreamAggregator,
    connection::{CloseOutcome, ConnectionManager, ConnectionState, RetryPolicy, SocketEvent},
    dispatcher::dispatch,
    observer::SessionObserver,
    protocol::{self, InboundEvent},
    queue::OutboundQueue,
    session::SessionId,
};
use tracing::{debug, info, warn};

/// The client-side state of a single chat conversation.
///
/// All inputs (consumer sends, socket events, timer expiry, shutdown) enter
/// through methods on this type and are applied in call order. Each method
/// returns the [`Command`]s the runtime must carry out, in order.
#[derive(Debug)]
pub struct ChatSession<O> {
    session_id: SessionId,
    queue: OutboundQueue,
    aggregator: StreamAggregator,
    connection: ConnectionManager,
    trigger: bool,
    observer: O,
}

impl<O: SessionObserver> ChatSession<O> {
    pub fn new(session_id: SessionId, policy: RetryPolicy, observer: O) -> Self {
        Self {
            session_id,
            queue: OutboundQueue::new(),
            aggregator: StreamAggregator::new(),
            connection: ConnectionManager::new(policy),
            trigger: false,
            observer,
        }
    }

    /// Begins the first connection attempt.
    pub fn start(&mut self) -> Vec<Command> {
        if !self.connection.start() {
            return Vec::new();
        }
        self.observer.connection_changed(ConnectionState::Connecting);
        vec![Command::Connect]
    }

    /// Submits one user turn.
    ///
    /// Sent right away while the connection is open, otherwise queued until
    /// the next successful open. Never fails.
    pub fn send(&mut self, text: impl Into<String>) -> Vec<Command> {
        let text = text.into();
        match self.connection.state() {
            ConnectionState::Open => vec![self.transmit_turn(&text)],
            _ if self.connection.is_shut_down() => {
                warn!("Client is shut down, dropping message.");
                Vec::new()
            }
            state => {
                info!(%state, queued = self.queue.len() + 1, "Connection is not open, queuing message.");
                self.queue.enqueue(text);
                Vec::new()
            }
        }
    }

    /// Applies one event reported by the socket layer.
    pub fn handle(&mut self, event: SocketEvent) -> Vec<Command> {
        match event {
            SocketEvent::Opened => self.on_opened(),
            SocketEvent::Frame(raw) => {
                self.on_frame(&raw);
                Vec::new()
            }
            SocketEvent::Closed => self.on_closed(),
            SocketEvent::ErrorObserved(error) => {
                warn!(%error, state = %self.connection.state(), "WebSocket error.");
                Vec::new()
            }
        }
    }

    /// The reconnection delay has elapsed.
    pub fn retry_elapsed(&mut self) -> Vec<Command> {
        if !self.connection.retry_elapsed() {
            return Vec::new();
        }
        info!(attempt = self.connection.retries(), "Reconnecting.");
        self.observer.connection_changed(ConnectionState::Connecting);
        vec![Command::Connect]
    }

    /// Tears the conversation down: drops queued turns, cancels a pending
    /// retry and closes the socket if one is live.
    pub fn shutdown(&mut self) -> Vec<Command> {
        let previous = self.connection.state();
        let teardown = self.connection.shutdown();
        let dropped = self.queue.clear();
        if dropped > 0 {
            warn!(dropped, "Dropping queued messages on shutdown.");
        }

        let mut commands = Vec::new();
        if teardown.cancel_retry {
            commands.push(Command::CancelReconnect);
        }
        if teardown.close_socket {
            commands.push(Command::Close);
        }
        if previous != ConnectionState::Disconnected {
            self.observer.connection_changed(ConnectionState::Disconnected);
        }
        commands
    }

    fn on_opened(&mut self) -> Vec<Command> {
        if !self.connection.opened() {
            debug!(state = %self.connection.state(), "Ignoring open outside of a connection attempt.");
            return Vec::new();
        }
        info!(session_id = %self.session_id, "WebSocket connection opened.");
        self.observer.connection_changed(ConnectionState::Open);

        let mut commands = vec![Command::Transmit(protocol::encode_handshake(
            &self.session_id,
        ))];
        let drained = self.queue.drain();
        if !drained.is_empty() {
            info!(count = drained.len(), "Flushing queued messages.");
        }
        for text in drained {
            commands.push(self.transmit_turn(&text));
        }
        commands
    }

    fn on_frame(&mut self, raw: &[u8]) {
        if self.connection.state() != ConnectionState::Open {
            debug!(state = %self.connection.state(), "Ignoring frame on a connection that is not open.");
            return;
        }
        debug!(frame = %String::from_utf8_lossy(raw), "Received from server.");
        for event in protocol::decode_frame(raw) {
            if event == InboundEvent::Trigger {
                self.trigger = true;
            }
            dispatch(event, &mut self.aggregator, &mut self.observer);
        }
    }

    fn on_closed(&mut self) -> Vec<Command> {
        match self.connection.closed() {
            CloseOutcome::Ignored => Vec::new(),
            CloseOutcome::Retry { delay, .. } => {
                info!("WebSocket connection closed.");
                self.observer.connection_changed(ConnectionState::Closed);
                vec![Command::ScheduleReconnect(delay)]
            }
            CloseOutcome::Exhausted => {
                info!("WebSocket connection closed.");
                self.observer.connection_changed(ConnectionState::Closed);
                Vec::new()
            }
        }
    }

    /// Encodes a turn for the wire and starts a fresh response for it.
    fn transmit_turn(&mut self, text: &str) -> Command {
        let frame = protocol::encode_turn(&self.session_id, text);
        self.aggregator.on_turn_start();
        self.observer.turn_started();
        self.observer
            .response_changed(self.aggregator.response(), self.aggregator.is_complete());
        Command::Transmit(frame)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_online(&self) -> bool {
        self.connection.state().is_online()
    }

    pub fn current_response(&self) -> &str {
        self.aggregator.response()
    }

    pub fn is_response_complete(&self) -> bool {
        self.aggregator.is_complete()
    }

    /// Latched once the backend raises the trigger.
    pub fn trigger_signal(&self) -> bool {
        self.trigger
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn retries(&self) -> u32 {
        self.connection.retries()
    }

    pub fn is_exhausted(&self) -> bool {
        self.connection.is_exhausted()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}
