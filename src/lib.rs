//! Persistent, self-reconnecting client for a streaming chat backend.
//!
//! This crate is the entry point for host applications. It re-exports the
//! runtime handle from `chatstream-client` and the I/O-free protocol core
//! from `chatstream-core`.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use chatstream::{ChatClient, ClientConfig};
//!
//! let client = ChatClient::connect(ClientConfig::new("ws://localhost:8000/ws"));
//! client.send("hello");
//!
//! let mut response = client.watch_response();
//! response.wait_for(|r| r.complete).await?;
//! println!("{}", client.current_response());
//! client.shutdown().await
//! # }
//! ```

pub use chatstream_client::{
    ChatClient, ClientConfig, ConnectionState, Response, RetryPolicy, SessionId, WatchObserver,
    Watchers,
};

/// The I/O-free protocol and state machine.
pub use chatstream_core;
