//! Main Entrypoint for the Terminal Chat
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and command line.
//! 2. Initializing logging (to stderr, so stdout carries only the chat).
//! 3. Starting the chat client and relaying stdin lines as turns.
//! 4. Rendering the streamed reply and connectivity changes.
//! 5. Shutting the connection down on EOF or `Ctrl+C`.

use anyhow::Context;
use chatstream_chat::{
    config::{Args, Config},
    render::{ReplyRenderer, status_line},
};
use chatstream_client::ChatClient;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_stream::{StreamExt, wrappers::WatchStream};
use tracing::{info, warn};

const TRIGGER_BANNER: &str = "\n*** You found the easter egg! ***\n";

/// Resolves on `Ctrl+C`. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler.");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let args = Args::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    config
        .apply_args(&args)
        .context("Invalid command-line arguments")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Start the Client ---
    let client = ChatClient::connect(config.client_config());
    info!(
        session_id = %client.session_id(),
        url = %config.ws_url,
        max_retries = config.max_retries,
        "Chat client started."
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut connection = WatchStream::new(client.watch_connection());
    let mut responses = WatchStream::new(client.watch_response());
    let mut trigger = client.watch_trigger();
    let mut renderer = ReplyRenderer::default();
    let mut stdout = tokio::io::stdout();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    // --- 4. Relay Input and Render Output ---
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => {
                    let text = line.trim();
                    if !text.is_empty() {
                        client.send(text);
                    }
                }
                None => break,
            },
            Some(state) = connection.next() => {
                stdout.write_all(status_line(state).as_bytes()).await?;
                stdout.flush().await?;
            },
            Some(response) = responses.next() => {
                let out = renderer.update(&response);
                if !out.is_empty() {
                    stdout.write_all(out.as_bytes()).await?;
                    stdout.flush().await?;
                }
            },
            Ok(()) = trigger.changed() => {
                if *trigger.borrow_and_update() {
                    stdout.write_all(TRIGGER_BANNER.as_bytes()).await?;
                    stdout.flush().await?;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    // --- 5. Shut Down ---
    client.shutdown().await?;
    info!("Chat client has shut down.");
    Ok(())
}
