use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;

/// Transport-assigned identifier for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notifications pushed from the hub to one or all connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "assigned-username")]
    AssignedUsername { username: Identity },
    #[serde(rename = "online-users")]
    OnlineUsers { users: Vec<Identity> },
    #[serde(rename = "user-joined")]
    UserJoined { username: Identity, message: String },
    #[serde(rename = "user-left")]
    UserLeft { username: Identity, message: String },
    #[serde(rename = "message")]
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<Identity>,
        message: String,
        #[serde(rename = "senderId")]
        sender_id: ConnectionId,
    },
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    pub fn user_joined(username: &Identity) -> Self {
        ServerEvent::UserJoined {
            username: username.clone(),
            message: format!("{} has joined the chat", username),
        }
    }

    pub fn user_left(username: &Identity) -> Self {
        ServerEvent::UserLeft {
            username: username.clone(),
            message: format!("{} has left the chat", username),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// Wire name of the event, as carried in the `type` field.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::AssignedUsername { .. } => "assigned-username",
            ServerEvent::OnlineUsers { .. } => "online-users",
            ServerEvent::UserJoined { .. } => "user-joined",
            ServerEvent::UserLeft { .. } => "user-left",
            ServerEvent::Message { .. } => "message",
            ServerEvent::Pong => "pong",
            ServerEvent::Error { .. } => "error",
        }
    }
}
