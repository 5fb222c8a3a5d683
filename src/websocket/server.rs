use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::WebSocketConfig;
use crate::hub::{ChatHub, ConnectionId, ServerEvent};
use crate::websocket::Connection;

pub struct WebSocketServer {
    hub: Arc<ChatHub>,
    config: WebSocketConfig,
}

impl WebSocketServer {
    pub fn new(hub: Arc<ChatHub>, config: WebSocketConfig) -> Self {
        Self { hub, config }
    }

    /// Accept connections until the listener fails.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let server = self.clone();
                    tokio::spawn(async move {
                        server.handle_connection(stream, addr).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    break;
                }
            }
        }
    }

    pub async fn handle_connection(self: Arc<Self>, raw_stream: TcpStream, addr: SocketAddr) {
        info!("New WebSocket connection from: {}", addr);

        let path = self.config.path.clone();
        let check_path = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            if req.uri().path() == path {
                Ok(resp)
            } else {
                let mut refusal = ErrorResponse::new(Some(format!("No chat endpoint at {}", req.uri().path())));
                *refusal.status_mut() = StatusCode::NOT_FOUND;
                Err(refusal)
            }
        };

        let ws_stream = match tokio_tungstenite::accept_hdr_async(raw_stream, check_path).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake with {}: {}", addr, e);
                return;
            }
        };

        let (ws_sink, ws_stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();

        let connection_id = ConnectionId::new();
        let connection = Connection::new(connection_id, self.hub.clone());
        self.hub.connect(connection_id, tx).await;

        let last_seen = connection.last_seen();
        let heartbeat_interval = self.config.heartbeat_interval();
        let heartbeat_timeout = self.config.heartbeat_timeout();

        // Forward hub events to the socket and keep the peer alive
        let mut send_task = tokio::spawn(async move {
            let mut ws_sink = ws_sink;
            let mut rx = rx;
            let mut heartbeat = tokio::time::interval(heartbeat_interval);
            heartbeat.tick().await;

            loop {
                tokio::select! {
                    event = rx.recv() => {
                        let Some(event) = event else { break };
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(e) => {
                                error!("Failed to serialize {} event: {}", event.name(), e);
                                continue;
                            }
                        };
                        if let Err(e) = ws_sink.send(Message::Text(text)).await {
                            error!("Error sending WebSocket message: {}", e);
                            break;
                        }
                    }
                    _ = heartbeat.tick() => {
                        if last_seen.read().await.elapsed() > heartbeat_timeout {
                            warn!("Heartbeat timeout for connection {}", connection_id);
                            break;
                        }
                        if let Err(e) = ws_sink.send(Message::Ping(Vec::new())).await {
                            error!("Failed to send heartbeat for connection {}: {}", connection_id, e);
                            break;
                        }
                    }
                }
            }

            if let Err(e) = ws_sink.close().await {
                debug!("Error closing WebSocket connection: {}", e);
            }
        });

        // Handle incoming WebSocket messages
        let mut receive_task = tokio::spawn(async move {
            let mut ws_stream = ws_stream;

            while let Some(message) = ws_stream.next().await {
                match message {
                    Ok(msg) => match connection.handle_message(msg).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => {
                            error!("Error handling message: {}", e);
                            break;
                        }
                    },
                    Err(e) => {
                        error!("Error receiving WebSocket message: {}", e);
                        break;
                    }
                }
            }
        });

        // Wait for either task to complete
        tokio::select! {
            _ = &mut send_task => {
                info!("Send task completed for connection {}", connection_id);
                receive_task.abort();
            }
            _ = &mut receive_task => {
                info!("Receive task completed for connection {}", connection_id);
                send_task.abort();
            }
        }

        self.hub.disconnect(connection_id).await;
        info!("Connection {} closed", connection_id);
    }

    pub fn hub(&self) -> Arc<ChatHub> {
        self.hub.clone()
    }
}
