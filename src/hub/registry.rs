use std::collections::HashMap;

use super::events::ConnectionId;
use crate::identity::Identity;

#[derive(Debug)]
struct Session {
    identity: Identity,
    joined: u64,
}

/// Live connections and the identity each one holds.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Session>,
    next_join: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ConnectionId, identity: Identity) {
        let joined = self.next_join;
        self.next_join += 1;
        self.sessions.insert(id, Session { identity, joined });
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Identity> {
        self.sessions.remove(id).map(|session| session.identity)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Identity> {
        self.sessions.get(id).map(|session| &session.identity)
    }

    /// Identities of all live connections, oldest first.
    pub fn roster(&self) -> Vec<Identity> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by_key(|session| session.joined);
        sessions
            .into_iter()
            .map(|session| session.identity.clone())
            .collect()
    }
}
