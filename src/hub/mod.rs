//! Session hub for the chat server
//!
//! This module owns the connection -> identity mapping, reacts to
//! connect, disconnect and message events from the transport, and fans
//! notifications out to live connections.
//!
//! The identity pool and the session registry are only touched under a
//! single lock, so concurrent connects cannot hand out the same name and
//! concurrent disconnects cannot release one twice.

mod events;
mod pool;
mod registry;

pub use events::{ConnectionId, ServerEvent};
pub use pool::{ConnectionPool, EventSink};
pub use registry::SessionRegistry;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::WebSocketError;
use crate::identity::{Identity, IdentityPool};

struct HubState {
    identities: IdentityPool,
    sessions: SessionRegistry,
}

pub struct ChatHub {
    state: Mutex<HubState>,
    pool: ConnectionPool,
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(IdentityPool::new())
    }
}

impl ChatHub {
    pub fn new(identities: IdentityPool) -> Self {
        Self {
            state: Mutex::new(HubState {
                identities,
                sessions: SessionRegistry::new(),
            }),
            pool: ConnectionPool::new(),
        }
    }

    /// Register a new connection, hand it an identity and announce it.
    pub async fn connect(&self, id: ConnectionId, sink: EventSink) -> Identity {
        let mut state = self.state.lock().await;
        self.pool.add(id, sink).await;

        if let Some(previous) = state.sessions.remove(&id) {
            warn!("Connection {} connected twice, releasing {}", id, previous);
            state.identities.release(&previous);
        }
        let identity = state.identities.allocate();
        state.sessions.insert(id, identity.clone());
        info!("Client connected: {} as {}", id, identity);

        let assigned = ServerEvent::AssignedUsername {
            username: identity.clone(),
        };
        if let Err(e) = self.pool.send_to(&id, assigned).await {
            error!("Failed to send assigned identity to {}: {}", id, e);
        }

        let users = state.sessions.roster();
        self.pool.broadcast(&ServerEvent::OnlineUsers { users }).await;
        self.pool.broadcast(&ServerEvent::user_joined(&identity)).await;

        identity
    }

    /// Drop a connection and announce its departure. Unknown ids are ignored.
    pub async fn disconnect(&self, id: ConnectionId) -> Option<Identity> {
        let mut state = self.state.lock().await;
        self.pool.remove(&id).await;

        let Some(identity) = state.sessions.remove(&id) else {
            debug!("Disconnect for unregistered connection {}", id);
            return None;
        };
        state.identities.release(&identity);
        info!("Client disconnected: {} ({})", id, identity);

        let users = state.sessions.roster();
        self.pool.broadcast(&ServerEvent::OnlineUsers { users }).await;
        self.pool.broadcast(&ServerEvent::user_left(&identity)).await;

        Some(identity)
    }

    /// Relay a chat message to every connection, the sender included.
    pub async fn message(&self, id: ConnectionId, payload: String) {
        let state = self.state.lock().await;
        let username = state.sessions.get(&id).cloned();

        match &username {
            Some(name) => info!("Received message from {}: {}", name, payload),
            None => warn!("Received message from unregistered connection {}", id),
        }

        let event = ServerEvent::Message {
            username,
            message: payload,
            sender_id: id,
        };
        self.pool.broadcast(&event).await;
    }

    /// Unicast outside the connection lifecycle, e.g. protocol replies.
    pub async fn send_to(&self, id: &ConnectionId, event: ServerEvent) -> Result<(), WebSocketError> {
        self.pool.send_to(id, event).await
    }

    pub async fn identity_of(&self, id: &ConnectionId) -> Option<Identity> {
        self.state.lock().await.sessions.get(id).cloned()
    }

    pub async fn online_users(&self) -> Vec<Identity> {
        self.state.lock().await.sessions.roster()
    }

    pub async fn used_identities(&self) -> Vec<Identity> {
        self.state.lock().await.identities.list_used()
    }

    pub async fn connection_count(&self) -> usize {
        self.pool.connection_count().await
    }
}
