use chatstream::{ChatClient, ClientConfig, ConnectionState, SessionId};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);
const SESSION: &str = "amber-basil-cedar-delta";

type ServerSocket = WebSocketStream<TcpStream>;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

fn config(url: &str) -> ClientConfig {
    ClientConfig::new(url)
        .with_session_id(SessionId::from(SESSION))
        .with_retry_delay(Duration::from_millis(20))
}

async fn accept_ws(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_json(ws: &mut ServerSocket) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

async fn send_text(ws: &mut ServerSocket, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

async fn wait_for_state(client: &ChatClient, state: ConnectionState) {
    let mut rx = client.watch_connection();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == state))
        .await
        .expect("timed out waiting for connection state")
        .unwrap();
}

async fn wait_for_complete(client: &ChatClient) -> String {
    let mut rx = client.watch_response();
    let response = tokio::time::timeout(WAIT, rx.wait_for(|r| r.complete))
        .await
        .expect("timed out waiting for a complete reply")
        .unwrap();
    response.text.clone()
}

fn handshake() -> Value {
    json!({ "session": SESSION, "init": true })
}

fn turn(message: &str) -> Value {
    json!({ "session": SESSION, "message": message, "init": false })
}

#[tokio::test]
async fn test_handshake_turn_and_streamed_reply() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let first = next_json(&mut ws).await;
        let second = next_json(&mut ws).await;
        send_text(&mut ws, r#"{"on_chat_model_stream":"Hel"}"#).await;
        send_text(&mut ws, r#"{"on_chat_model_stream":"lo"}"#).await;
        send_text(&mut ws, r#"{"on_chat_model_end":true}"#).await;
        (first, second, ws)
    });

    let client = ChatClient::connect(config(&url));
    wait_for_state(&client, ConnectionState::Open).await;
    assert!(client.is_online());
    client.send("hello");

    assert_eq!(wait_for_complete(&client).await, "Hello");
    let (first, second, _ws) = server.await.unwrap();
    assert_eq!(first, handshake());
    assert_eq!(second, turn("hello"));

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_send_before_open_is_flushed_after_handshake() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let mut frames = Vec::new();
        for _ in 0..3 {
            frames.push(next_json(&mut ws).await);
        }
        frames
    });

    let client = ChatClient::connect(config(&url));
    client.send("one");
    client.send("two");

    let frames = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(frames, vec![handshake(), turn("one"), turn("two")]);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_frame_is_ignored() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        next_json(&mut ws).await;
        send_text(&mut ws, "not json at all").await;
        send_text(&mut ws, r#"{"on_chat_model_stream":"ok","on_chat_model_end":true}"#).await;
        ws
    });

    let client = ChatClient::connect(config(&url));

    assert_eq!(wait_for_complete(&client).await, "ok");
    assert_eq!(client.connection_state(), ConnectionState::Open);
    let _ws = server.await.unwrap();

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_trigger_is_latched() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        next_json(&mut ws).await;
        send_text(&mut ws, r#"{"on_easter_egg":true}"#).await;
        send_text(&mut ws, r#"{"on_easter_egg":false}"#).await;
        send_text(&mut ws, r#"{"on_chat_model_end":true}"#).await;
        ws
    });

    let client = ChatClient::connect(config(&url));
    let mut trigger = client.watch_trigger();
    tokio::time::timeout(WAIT, trigger.wait_for(|t| *t))
        .await
        .unwrap()
        .unwrap();

    wait_for_complete(&client).await;
    assert!(client.trigger_signal());
    let _ws = server.await.unwrap();

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reconnects_after_server_close() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut first = accept_ws(&listener).await;
        let first_handshake = next_json(&mut first).await;
        first.close(None).await.unwrap();
        drop(first);

        let mut second = accept_ws(&listener).await;
        let second_handshake = next_json(&mut second).await;
        (first_handshake, second_handshake, second)
    });

    let client = ChatClient::connect(config(&url));

    let (first, second, _ws) = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(first, handshake());
    assert_eq!(second, handshake());
    wait_for_state(&client, ConnectionState::Open).await;
    assert_eq!(client.session_id().as_str(), SESSION);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let (listener, url) = bind().await;
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    let client = ChatClient::connect(
        config(&url)
            .with_max_retries(5)
            .with_retry_delay(Duration::from_millis(10)),
    );

    tokio::time::timeout(WAIT, async {
        while accepted.load(Ordering::SeqCst) < 6 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("expected six connection attempts");
    wait_for_state(&client, ConnectionState::Closed).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 6);
    assert_eq!(client.connection_state(), ConnectionState::Closed);
    assert!(!client.is_online());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_the_socket() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        next_json(&mut ws).await;
        ws.next().await
    });

    let client = ChatClient::connect(config(&url));
    let connection = client.watch_connection();
    wait_for_state(&client, ConnectionState::Open).await;

    client.shutdown().await.unwrap();

    let last = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert!(matches!(last, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    assert_eq!(*connection.borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_shutdown_cancels_pending_reconnect() {
    let (listener, url) = bind().await;
    let mut ws = {
        let client =
            ChatClient::connect(config(&url).with_retry_delay(Duration::from_millis(300)));
        let mut ws = accept_ws(&listener).await;
        next_json(&mut ws).await;
        ws.close(None).await.unwrap();

        wait_for_state(&client, ConnectionState::Closed).await;
        client.shutdown().await.unwrap();
        ws
    };
    let _ = ws.next().await;

    let reconnect = tokio::time::timeout(Duration::from_millis(600), listener.accept()).await;
    assert!(reconnect.is_err(), "no reconnection after shutdown");
}

#[tokio::test]
async fn test_drop_closes_the_socket() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        next_json(&mut ws).await;
        ws.next().await
    });

    let client = ChatClient::connect(config(&url));
    let mut connection = client.watch_connection();
    wait_for_state(&client, ConnectionState::Open).await;

    drop(client);

    let last = tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    assert!(matches!(last, Some(Ok(Message::Close(_))) | None | Some(Err(_))));
    tokio::time::timeout(WAIT, connection.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .expect("timed out waiting for teardown")
        .unwrap();
}

#[tokio::test]
async fn test_drop_cancels_pending_reconnect() {
    let (listener, url) = bind().await;
    let client = ChatClient::connect(config(&url).with_retry_delay(Duration::from_millis(300)));
    let mut connection = client.watch_connection();

    let mut ws = accept_ws(&listener).await;
    next_json(&mut ws).await;
    ws.close(None).await.unwrap();
    wait_for_state(&client, ConnectionState::Closed).await;

    drop(client);
    tokio::time::timeout(WAIT, connection.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .expect("timed out waiting for teardown")
        .unwrap();
    let _ = ws.next().await;

    let reconnect = tokio::time::timeout(Duration::from_millis(600), listener.accept()).await;
    assert!(reconnect.is_err(), "no reconnection after drop");
}
