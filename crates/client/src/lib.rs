//! Tokio/WebSocket runtime for the chat core.
//!
//! [`ChatClient::connect`] spawns a task that owns a `tokio-tungstenite`
//! socket and a [`chatstream_core::ChatSession`], executes the commands the
//! session emits, and publishes the observable state on watch channels.

mod client;
pub mod config;
pub mod observer;
mod runtime;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use observer::{Response, WatchObserver, Watchers};

pub use chatstream_core::{ConnectionState, RetryPolicy, SessionId};
