//! Terminal front-end for the chat client.
//!
//! Loads configuration from the environment and command line, and renders
//! the streamed reply incrementally. The `chat` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod render;
