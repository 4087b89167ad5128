//! The handle a host application holds to talk to the chat backend.

use crate::{
    config::ClientConfig,
    observer::{Response, WatchObserver, Watchers},
    runtime::{Request, Runtime},
};
use anyhow::{Context, Result};
use chatstream_core::{ChatSession, ConnectionState, SessionId};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::Instrument;

/// A persistent, self-reconnecting connection to one chat conversation.
///
/// The connection runs on a background task. The handle never blocks and
/// never reports errors: transport problems show up only as
/// [`ConnectionState`] changes. Dropping the handle tears the connection down.
#[derive(Debug)]
pub struct ChatClient {
    session_id: SessionId,
    requests: mpsc::UnboundedSender<Request>,
    watchers: Watchers,
    task: Option<JoinHandle<()>>,
}

impl ChatClient {
    /// Starts connecting in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: ClientConfig) -> Self {
        let session_id = config.session_id.unwrap_or_else(SessionId::generate);
        let (observer, watchers) = WatchObserver::new();
        let (requests, requests_rx) = mpsc::unbounded_channel();

        let session = ChatSession::new(session_id.clone(), config.retry, observer);
        let runtime = Runtime::new(config.url, session, requests_rx);
        let span = tracing::info_span!("chat_session", %session_id);
        let task = tokio::spawn(runtime.run().instrument(span));

        Self {
            session_id,
            requests,
            watchers,
            task: Some(task),
        }
    }

    /// Sends one user turn, or queues it until the connection is open.
    pub fn send(&self, text: impl Into<String>) {
        // Fails only once the runtime has stopped, which is after shutdown.
        let _ = self.requests.send(Request::Send(text.into()));
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.watchers.connection.borrow()
    }

    /// The connectivity flag: true only while the socket is open.
    pub fn is_online(&self) -> bool {
        self.connection_state().is_online()
    }

    /// The reply to the current turn so far.
    pub fn current_response(&self) -> String {
        self.watchers.response.borrow().text.clone()
    }

    pub fn is_response_complete(&self) -> bool {
        self.watchers.response.borrow().complete
    }

    pub fn response(&self) -> Response {
        self.watchers.response.borrow().clone()
    }

    /// Whether the backend has raised the out-of-band trigger.
    pub fn trigger_signal(&self) -> bool {
        *self.watchers.trigger.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.watchers.connection.clone()
    }

    pub fn watch_response(&self) -> watch::Receiver<Response> {
        self.watchers.response.clone()
    }

    pub fn watch_trigger(&self) -> watch::Receiver<bool> {
        self.watchers.trigger.clone()
    }

    /// Closes the connection, cancels any pending reconnection and waits for
    /// the background task to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.requests.send(Request::Shutdown);
        if let Some(task) = self.task.take() {
            task.await.context("Chat runtime task failed")?;
        }
        Ok(())
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Shutdown);
    }
}
