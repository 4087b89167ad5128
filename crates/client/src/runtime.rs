//! The task that owns the socket and drives a [`ChatSession`].
//!
//! Consumer requests, socket frames, connection results and the retry timer
//! are all handled in this one task, so the session never needs a lock.

use crate::observer::WatchObserver;
use anyhow::{Context, Result};
use chatstream_core::{ChatSession, Command, SocketEvent};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::{future::Future, pin::Pin, time::Duration};
use tokio::{net::TcpStream, sync::mpsc, time::Sleep};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};
use tracing::{debug, info, warn};

/// Upper bound on flushing the close frame during teardown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;
type ConnectFuture = Pin<Box<dyn Future<Output = Result<WsStream>> + Send>>;

/// A request from the [`crate::ChatClient`] handle.
#[derive(Debug)]
pub(crate) enum Request {
    Send(String),
    Shutdown,
}

pub(crate) struct Runtime {
    url: String,
    session: ChatSession<WatchObserver>,
    requests: mpsc::UnboundedReceiver<Request>,
    connecting: Option<ConnectFuture>,
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    retry_timer: Option<Pin<Box<Sleep>>>,
}

impl Runtime {
    pub(crate) fn new(
        url: String,
        session: ChatSession<WatchObserver>,
        requests: mpsc::UnboundedReceiver<Request>,
    ) -> Self {
        Self {
            url,
            session,
            requests,
            connecting: None,
            writer: None,
            reader: None,
            retry_timer: None,
        }
    }

    /// Runs until the handle asks for shutdown or is dropped.
    pub(crate) async fn run(mut self) {
        let commands = self.session.start();
        self.execute(commands).await;

        loop {
            tokio::select! {
                biased;
                request = self.requests.recv() => match request {
                    Some(Request::Send(text)) => {
                        let commands = self.session.send(text);
                        self.execute(commands).await;
                    }
                    Some(Request::Shutdown) | None => {
                        let commands = self.session.shutdown();
                        self.execute(commands).await;
                        break;
                    }
                },
                result = finish_connect(&mut self.connecting) => {
                    self.connecting = None;
                    match result {
                        Ok(stream) => {
                            let (writer, reader) = stream.split();
                            self.writer = Some(writer);
                            self.reader = Some(reader);
                            self.apply(SocketEvent::Opened).await;
                        }
                        Err(e) => {
                            self.apply(SocketEvent::ErrorObserved(format!("{e:#}"))).await;
                            self.apply(SocketEvent::Closed).await;
                        }
                    }
                },
                frame = next_frame(&mut self.reader) => self.on_frame(frame).await,
                _ = retry_fired(&mut self.retry_timer) => {
                    self.retry_timer = None;
                    let commands = self.session.retry_elapsed();
                    self.execute(commands).await;
                },
            }
        }
        info!("Chat runtime stopped.");
    }

    async fn on_frame(&mut self, frame: Option<Result<Message, WsError>>) {
        match frame {
            Some(Ok(Message::Text(text))) => {
                self.apply(SocketEvent::Frame(text.as_bytes().to_vec())).await;
            }
            Some(Ok(Message::Binary(data))) => {
                self.apply(SocketEvent::Frame(data.to_vec())).await;
            }
            Some(Ok(Message::Close(close_frame))) => {
                debug!(?close_frame, "Server sent close frame.");
                self.drop_socket();
                self.apply(SocketEvent::Closed).await;
            }
            // Ping/pong replies are handled by tungstenite.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                self.drop_socket();
                self.apply(SocketEvent::ErrorObserved(e.to_string())).await;
                self.apply(SocketEvent::Closed).await;
            }
            None => {
                self.drop_socket();
                self.apply(SocketEvent::Closed).await;
            }
        }
    }

    async fn apply(&mut self, event: SocketEvent) {
        let commands = self.session.handle(event);
        self.execute(commands).await;
    }

    async fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Connect => {
                    info!(url = %self.url, "Connecting to chat backend.");
                    let url = self.url.clone();
                    self.connecting = Some(Box::pin(async move {
                        let (stream, _) = connect_async(url.as_str())
                            .await
                            .with_context(|| format!("Failed to connect to {url}"))?;
                        Ok(stream)
                    }));
                }
                Command::Transmit(frame) => match self.writer.as_mut() {
                    Some(writer) => {
                        if let Err(e) = writer.send(Message::Text(frame.into())).await {
                            warn!(error = %e, "Failed to write frame to WebSocket.");
                        }
                    }
                    None => warn!("No open WebSocket to write to, frame dropped."),
                },
                Command::ScheduleReconnect(delay) => {
                    self.retry_timer = Some(Box::pin(tokio::time::sleep(delay)));
                }
                Command::CancelReconnect => {
                    self.retry_timer = None;
                }
                Command::Close => {
                    self.connecting = None;
                    self.reader = None;
                    if let Some(mut writer) = self.writer.take() {
                        match tokio::time::timeout(CLOSE_TIMEOUT, writer.close()).await {
                            Ok(Ok(())) => debug!("WebSocket closed."),
                            Ok(Err(e)) => debug!(error = %e, "WebSocket close failed."),
                            Err(_) => warn!("Timed out closing WebSocket."),
                        }
                    }
                }
            }
        }
    }

    fn drop_socket(&mut self) {
        self.writer = None;
        self.reader = None;
    }
}

async fn finish_connect(connecting: &mut Option<ConnectFuture>) -> Result<WsStream> {
    match connecting.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn next_frame(reader: &mut Option<WsReader>) -> Option<Result<Message, WsError>> {
    match reader.as_mut() {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}

async fn retry_fired(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer.as_mut() {
        Some(timer) => timer.await,
        None => std::future::pending().await,
    }
}
