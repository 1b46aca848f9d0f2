use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use skirmish_core::entity::EntityId;
use skirmish_core::net::messages::{ClientMessage, InitMsg, JoinMsg, ServerMessage};
use skirmish_core::net::protocol::{
    PROTOCOL_VERSION, decode_server_message, encode_client_message,
};
use skirmish_server::build_app;
use skirmish_server::config::ServerConfig;
use skirmish_world::WorldConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server without bots so event streams are deterministic.
    pub async fn new() -> Self {
        let config = ServerConfig {
            world: WorldConfig {
                bots_enabled: false,
                ..WorldConfig::default()
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client to the given URL.
pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// Send a ClientMessage from a WS stream.
pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Send a Join with the given name and return the Init snapshot.
pub async fn ws_join(stream: &mut WsStream, name: &str) -> InitMsg {
    let msg = ClientMessage::Join(JoinMsg {
        color: None,
        name: Some(name.to_string()),
        protocol_version: PROTOCOL_VERSION,
    });
    ws_send_client_msg(stream, &msg).await;

    match ws_read_server_msg(stream).await {
        ServerMessage::Init(init) => *init,
        other => panic!("Expected Init, got: {other:?}"),
    }
}

/// Connect and join in one step. Returns the stream and the assigned id.
pub async fn join_player(server: &TestServer, name: &str) -> (WsStream, EntityId) {
    let mut stream = ws_connect(&server.ws_url()).await;
    let init = ws_join(&mut stream, name).await;
    (stream, init.id)
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read a ServerMessage, returning None on timeout.
pub async fn ws_try_read_server_msg(
    stream: &mut WsStream,
    timeout_ms: u64,
) -> Option<ServerMessage> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return decode_server_message(&data).unwrap(),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    panic!("WebSocket error or closed")
                },
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Read the next ServerMessage from a WebSocket stream (5s timeout).
pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Wait until the server closes the stream (5s timeout).
pub async fn ws_expect_closed(stream: &mut WsStream) {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(Message::Binary(data))) => {
                    panic!("Unexpected message before close: {data:?}")
                },
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for close");
}

/// Minimal HTTP/1.1 GET. Returns the status code and body.
pub async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("Timed out reading HTTP response")
        .unwrap();
    let text = String::from_utf8_lossy(&raw).into_owned();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}
