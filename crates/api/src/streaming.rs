//! WebSocket notification gateway.
//!
//! Clients open `/ws` and announce themselves with a `register` message
//! carrying their user ID and access token. Each registered socket gets an
//! outbound queue; the gateway fans notifications out to every socket of
//! the recipient. The registry is process-local.

#![allow(missing_docs)]

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use platebook_core::{LiveDelivery, NotificationEvent};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::middleware::AppState;

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Bind this socket to a user.
    Register {
        #[serde(rename = "userId")]
        user_id: String,
        token: String,
    },
}

/// Server-to-client message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Registration accepted.
    Registered {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// A like or comment notification.
    Notification(NotificationEvent),
    /// A client message could not be handled.
    Error { message: String },
}

type Connections = HashMap<String, HashMap<u64, mpsc::UnboundedSender<ServerMessage>>>;

/// Registry of live sockets, keyed by user.
#[derive(Clone, Default)]
pub struct NotificationGateway {
    connections: Arc<RwLock<Connections>>,
    next_id: Arc<AtomicU64>,
}

impl NotificationGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a socket for a user. Returns its connection ID and the
    /// queue of messages to write to it.
    pub async fn register(&self, user_id: &str) -> (u64, mpsc::UnboundedReceiver<ServerMessage>) {
        let conn_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.connections
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(conn_id, tx);

        debug!(user_id = %user_id, conn_id, "Socket registered");
        (conn_id, rx)
    }

    /// Forget a socket.
    pub async fn unregister(&self, user_id: &str, conn_id: u64) {
        let mut connections = self.connections.write().await;
        if let Some(sockets) = connections.get_mut(user_id) {
            sockets.remove(&conn_id);
            if sockets.is_empty() {
                connections.remove(user_id);
            }
        }
        debug!(user_id = %user_id, conn_id, "Socket unregistered");
    }

    /// Number of open sockets of a user.
    pub async fn connection_count(&self, user_id: &str) -> usize {
        self.connections
            .read()
            .await
            .get(user_id)
            .map_or(0, HashMap::len)
    }
}

#[async_trait]
impl LiveDelivery for NotificationGateway {
    async fn is_connected(&self, user_id: &str) -> bool {
        self.connection_count(user_id).await > 0
    }

    async fn deliver(&self, user_id: &str, event: &NotificationEvent) -> bool {
        let mut connections = self.connections.write().await;
        let Some(sockets) = connections.get_mut(user_id) else {
            return false;
        };

        // Closed sockets are pruned as they are found.
        sockets.retain(|_, tx| tx.send(ServerMessage::Notification(event.clone())).is_ok());
        let delivered = !sockets.is_empty();
        if !delivered {
            connections.remove(user_id);
        }
        delivered
    }
}

/// WebSocket handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(error = %e, "Failed to encode socket message");
            None
        }
    }
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Set once the client registers.
    let mut registration: Option<(String, u64)> = None;
    let mut outbound: Option<mpsc::UnboundedReceiver<ServerMessage>> = None;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(incoming) = incoming else { break };
                match incoming {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Register { user_id, token }) => {
                                match register(&state, &user_id, &token).await {
                                    Ok(rx) => {
                                        if let Some((old_user, old_conn)) = registration.take() {
                                            state.gateway.unregister(&old_user, old_conn).await;
                                        }
                                        registration = Some((user_id.clone(), rx.0));
                                        outbound = Some(rx.1);
                                        ServerMessage::Registered { user_id }
                                    }
                                    Err(message) => ServerMessage::Error { message },
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, "Unparseable socket message");
                                ServerMessage::Error {
                                    message: "Invalid message".to_string(),
                                }
                            }
                        };

                        // Sent before anything queued by the flush in `register`.
                        if let Some(msg) = encode(&reply) {
                            if sender.send(msg).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            Some(msg) = recv_outbound(&mut outbound) => {
                if let Some(frame) = encode(&msg) {
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    if let Some((user_id, conn_id)) = registration {
        state.gateway.unregister(&user_id, conn_id).await;
        info!(user_id = %user_id, "Notification socket closed");
    }
}

/// Next queued message, or pending forever before registration.
async fn recv_outbound(
    outbound: &mut Option<mpsc::UnboundedReceiver<ServerMessage>>,
) -> Option<ServerMessage> {
    match outbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Check the token against the announced user, open a queue and move the
/// user's unsent notifications onto it.
async fn register(
    state: &AppState,
    user_id: &str,
    token: &str,
) -> Result<(u64, mpsc::UnboundedReceiver<ServerMessage>), String> {
    let user = state
        .user_service
        .authenticate(token)
        .await
        .map_err(|_| "Invalid token".to_string())?;

    if user.id != user_id {
        warn!(claimed = %user_id, actual = %user.id, "Socket registration for another user");
        return Err("Token does not match userId".to_string());
    }

    let registered = state.gateway.register(user_id).await;
    info!(user_id = %user_id, "Notification socket registered");

    if let Err(e) = state.notification_service.flush_pending(user_id).await {
        warn!(error = %e, user_id = %user_id, "Failed to flush pending notifications");
    }
    Ok(registered)
}
