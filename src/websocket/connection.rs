use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::{AppError, WebSocketError};
use crate::hub::{ChatHub, ConnectionId, ServerEvent};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "message")]
    Message(String),
    #[serde(rename = "ping")]
    Ping,
}

/// Inbound side of one WebSocket connection.
pub struct Connection {
    id: ConnectionId,
    hub: Arc<ChatHub>,
    last_seen: Arc<RwLock<Instant>>,
}

impl Connection {
    pub fn new(id: ConnectionId, hub: Arc<ChatHub>) -> Self {
        Self {
            id,
            hub,
            last_seen: Arc::new(RwLock::new(Instant::now())),
        }
    }

    /// Returns `Ok(false)` once the peer asked to close.
    pub async fn handle_message(&self, msg: Message) -> Result<bool, AppError> {
        *self.last_seen.write().await = Instant::now();

        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Message(payload)) => {
                    self.hub.message(self.id, payload).await;
                }
                Ok(ClientMessage::Ping) => {
                    self.reply(ServerEvent::Pong).await?;
                }
                Err(e) => {
                    let err = WebSocketError::InvalidFormat(e.to_string());
                    warn!("Failed to parse message from {}: {}", self.id, err);
                    self.reply(ServerEvent::error(err.to_string())).await?;
                }
            },
            Message::Binary(bin) => {
                debug!("Received binary message from {} of {} bytes", self.id, bin.len());
                self.reply(ServerEvent::error("Binary messages are not supported"))
                    .await?;
            }
            Message::Close(reason) => {
                info!("Client initiated close for connection {}: {:?}", self.id, reason);
                return Ok(false);
            }
            // tungstenite answers pings itself; both only refresh last_seen
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
        Ok(true)
    }

    async fn reply(&self, event: ServerEvent) -> Result<(), AppError> {
        self.hub.send_to(&self.id, event).await?;
        Ok(())
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn last_seen(&self) -> Arc<RwLock<Instant>> {
        self.last_seen.clone()
    }
}
