use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};

use super::events::{ConnectionId, ServerEvent};
use crate::error::WebSocketError;

/// Outbound handle for one connection.
pub type EventSink = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: Arc<RwLock<HashMap<ConnectionId, EventSink>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add(&self, id: ConnectionId, sender: EventSink) {
        self.connections.write().await.insert(id, sender);
        info!("Added connection {} to pool", id);
    }

    pub async fn remove(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            info!("Removed connection {} from pool", id);
        }
        removed
    }

    /// Best-effort fan-out; a closed sink is logged and skipped.
    pub async fn broadcast(&self, event: &ServerEvent) {
        let connections = self.connections.read().await;

        for (id, sender) in connections.iter() {
            if let Err(e) = sender.send(event.clone()) {
                error!("Failed to broadcast {} to connection {}: {}", event.name(), id, e);
            }
        }
    }

    pub async fn send_to(&self, id: &ConnectionId, event: ServerEvent) -> Result<(), WebSocketError> {
        if let Some(sender) = self.connections.read().await.get(id) {
            sender
                .send(event)
                .map_err(|e| WebSocketError::SendError(format!("Failed to send message: {}", e)))?;
            Ok(())
        } else {
            Err(WebSocketError::ConnectionError(format!("Connection {} not found", id)))
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[tokio::test]
    async fn test_connection_pool() {
        let pool = ConnectionPool::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();

        // Test adding connections
        pool.add(id1, tx1).await;
        pool.add(id2, tx2).await;
        assert_eq!(pool.connection_count().await, 2);

        // Test broadcasting
        pool.broadcast(&ServerEvent::Pong).await;
        assert_eq!(rx1.try_recv().ok(), Some(ServerEvent::Pong));
        assert_eq!(rx2.try_recv().ok(), Some(ServerEvent::Pong));

        // Test removing connection
        assert!(pool.remove(&id1).await);
        assert!(!pool.remove(&id1).await);
        assert_eq!(pool.connection_count().await, 1);

        // Test sending to specific connection
        let direct = ServerEvent::AssignedUsername {
            username: Identity::new("Noman"),
        };
        pool.send_to(&id2, direct.clone()).await.unwrap();
        assert_eq!(rx2.try_recv().ok(), Some(direct));

        // Removed connections are reported, not silently dropped
        assert!(matches!(
            pool.send_to(&id1, ServerEvent::Pong).await,
            Err(WebSocketError::ConnectionError(_))
        ));
    }

    #[tokio::test]
    async fn test_dead_sink_does_not_block_others() {
        let pool = ConnectionPool::new();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        let dead = ConnectionId::new();
        pool.add(dead, dead_tx).await;
        pool.add(ConnectionId::new(), live_tx).await;
        drop(dead_rx);

        pool.broadcast(&ServerEvent::Pong).await;
        assert_eq!(live_rx.try_recv().ok(), Some(ServerEvent::Pong));

        assert!(matches!(
            pool.send_to(&dead, ServerEvent::Pong).await,
            Err(WebSocketError::SendError(_))
        ));
    }
}
