//! Settings for a [`crate::ChatClient`].

use chatstream_core::{RetryPolicy, SessionId};
use std::time::Duration;

/// Backend endpoint used when nothing else is configured.
pub const DEFAULT_URL: &str = "ws://localhost:8000/ws";

/// Everything needed to start one chat connection.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat backend.
    pub url: String,
    /// Reconnection budget and delay.
    pub retry: RetryPolicy,
    /// Conversation identifier. A fresh one is generated when unset.
    pub session_id: Option<SessionId>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = delay;
        self
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            retry: RetryPolicy::default(),
            session_id: None,
        }
    }
}
