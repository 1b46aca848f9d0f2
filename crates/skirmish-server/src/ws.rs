use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};

use skirmish_core::entity::EntityId;
use skirmish_core::net::messages::{ClientMessage, JoinMsg, JoinRejectedMsg, ServerMessage};
use skirmish_core::net::protocol::{
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION, decode_client_message, decode_message_type,
    encode_server_message,
};

use crate::state::{AppState, ConnectionGuard};
use crate::world_loop::WorldCommand;

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Wait for the first message: must be a Join.
    let first_msg = match ws_receiver.next().await {
        Some(Ok(Message::Binary(data))) => data,
        _ => return,
    };
    let Ok(ClientMessage::Join(join)) = decode_client_message(&first_msg) else {
        tracing::debug!("First frame was not a join, closing");
        return;
    };

    // Validate protocol version
    if join.protocol_version != 0 && join.protocol_version != PROTOCOL_VERSION {
        reject(
            &mut ws_sender,
            &format!(
                "Protocol version mismatch: client={}, server={}",
                join.protocol_version, PROTOCOL_VERSION
            ),
        )
        .await;
        return;
    }

    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);
    let id = match attempt_join(join, tx, &state).await {
        Ok(id) => id,
        Err(reason) => {
            reject(&mut ws_sender, &reason).await;
            return;
        },
    };

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, id).await;

    // Player disconnected, clean up
    state.send(WorldCommand::Leave { id });
    tracing::info!(id, "Player disconnected");
}

async fn attempt_join(
    join: JoinMsg,
    sender: mpsc::Sender<Bytes>,
    state: &AppState,
) -> Result<EntityId, String> {
    let (reply, reply_rx) = oneshot::channel();
    let queued = state.send(WorldCommand::Join {
        color: join.color,
        name: join.name,
        sender,
        reply,
    });
    if !queued {
        return Err("Server is shutting down".to_string());
    }
    match reply_rx.await {
        Ok(Ok(id)) => Ok(id),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("Server is shutting down".to_string()),
    }
}

/// Send `JoinRejected` and close the socket.
async fn reject(ws_sender: &mut SplitSink<WebSocket, Message>, reason: &str) {
    let msg = ServerMessage::JoinRejected(JoinRejectedMsg {
        reason: reason.to_string(),
    });
    match encode_server_message(&msg) {
        Ok(data) => {
            if let Err(e) = ws_sender.send(Message::Binary(data.into())).await {
                tracing::warn!(error = %e, "Failed to send join rejection");
                return;
            }
        },
        Err(e) => tracing::error!(error = %e, "Failed to encode JoinRejected"),
    }
    let _ = ws_sender.send(Message::Close(None)).await;
}

fn spawn_writer(mut ws_sender: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Bytes>) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender.send(Message::Binary(data)).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(ws_receiver: &mut SplitStream<WebSocket>, state: &AppState, id: EntityId) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        // Rate limit: drop messages that exceed per-connection rate
        if !rate_limiter.allow() {
            tracing::warn!(id, "Rate limited");
            continue;
        }

        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            continue;
        }

        let Ok(msg_type) = decode_message_type(&data) else {
            continue;
        };

        // Server-authoritative: world events only ever flow outward.
        if !msg_type.is_client_message() {
            tracing::warn!(id, ?msg_type, "Rejected server-only message from client");
            continue;
        }

        let cmd = match decode_client_message(&data) {
            Ok(ClientMessage::Move(m)) => WorldCommand::Move {
                id,
                x: m.x,
                y: m.y,
                z: m.z,
                ry: m.ry,
            },
            Ok(ClientMessage::Shoot(s)) => WorldCommand::Shoot {
                id,
                hit_id: s.hit_id,
            },
            Ok(ClientMessage::CollectPickup(c)) => WorldCommand::CollectPickup {
                id,
                pickup_id: c.pickup_id,
            },
            Ok(ClientMessage::Join(_)) => {
                tracing::debug!(id, "Ignoring repeated join");
                continue;
            },
            Err(e) => {
                tracing::debug!(id, error = %e, "Dropping undecodable message");
                continue;
            },
        };

        if !state.send(cmd) {
            break;
        }
    }
}
