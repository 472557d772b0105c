//! Tracks live transport connections per identity and derives presence.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::events::ServerEvent;
use crate::rooms::RoomId;

pub type ConnectionId = Uuid;

/// Outbound handle for one live socket. Cloned into every room the
/// connection joins; pushes are synchronous fire-and-forget so a broadcast
/// step never suspends.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub identity: String,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(identity: impl Into<String>, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            sender,
        }
    }

    /// Best-effort delivery. A closed queue means the socket already went
    /// away; the miss is silent and final for this event instance.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Presence transition observed by a register/unregister call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    Online,
    Offline,
    Unchanged,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    by_identity: HashMap<String, HashSet<ConnectionId>>,
}

/// Live connection set per identity. An identity is online while it has at
/// least one registered connection (multi-device is the normal case, not an
/// edge case).
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The per-identity mailbox room, in a namespace disjoint from chat
    /// rooms. Deterministic: the same identity always maps to the same room.
    pub fn personal_room_of(identity: &str) -> RoomId {
        RoomId::Personal(identity.to_string())
    }

    /// Add a connection. Reports `Online` when this is the identity's first
    /// live connection.
    pub async fn register(&self, handle: ConnectionHandle) -> PresenceChange {
        let mut inner = self.inner.write().await;
        let set = inner.by_identity.entry(handle.identity.clone()).or_default();
        let first = set.is_empty();
        set.insert(handle.id);
        inner.connections.insert(handle.id, handle);
        if first {
            PresenceChange::Online
        } else {
            PresenceChange::Unchanged
        }
    }

    /// Remove a connection. Reports `Offline` when the owning identity's
    /// last connection goes. Removing an unknown connection is a no-op so
    /// duplicate disconnect signals are harmless.
    pub async fn unregister(&self, id: ConnectionId) -> PresenceChange {
        let mut inner = self.inner.write().await;
        let Some(handle) = inner.connections.remove(&id) else {
            return PresenceChange::Unchanged;
        };

        if let Some(set) = inner.by_identity.get_mut(&handle.identity) {
            set.remove(&id);
            if !set.is_empty() {
                return PresenceChange::Unchanged;
            }
        } else {
            return PresenceChange::Unchanged;
        }

        inner.by_identity.remove(&handle.identity);
        PresenceChange::Offline
    }

    pub async fn is_online(&self, identity: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .by_identity
            .get(identity)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    pub async fn connection_count(&self, identity: &str) -> usize {
        let inner = self.inner.read().await;
        inner
            .by_identity
            .get(identity)
            .map(|set| set.len())
            .unwrap_or(0)
    }
}
