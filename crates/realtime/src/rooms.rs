//! Room membership and the broadcast primitive.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::RwLock;

use crate::events::ServerEvent;
use crate::registry::{ConnectionHandle, ConnectionId};

/// A named broadcast target. Chat rooms are joined by connections actively
/// viewing that conversation; personal rooms are each identity's mailbox and
/// receive message events regardless of what is on screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    Chat(String),
    Personal(String),
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::Chat(id) => write!(f, "chat:{id}"),
            RoomId::Personal(id) => write!(f, "user:{id}"),
        }
    }
}

/// In-memory routing table mapping rooms to the connections joined to them.
///
/// This is never an authority on chat membership (the store is); it only
/// records where live deliveries can currently land, and is rebuilt from
/// scratch whenever a client reconnects.
#[derive(Default)]
pub struct RoomRouter {
    rooms: RwLock<HashMap<RoomId, HashMap<ConnectionId, ConnectionHandle>>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection may be a member of many rooms at once (its personal room
    /// plus any chat rooms it is viewing).
    pub async fn join(&self, room: RoomId, member: ConnectionHandle) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room).or_default().insert(member.id, member);
    }

    pub async fn leave(&self, room: &RoomId, connection: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let emptied = match rooms.get_mut(room) {
            Some(members) => {
                members.remove(&connection);
                members.is_empty()
            }
            None => return,
        };
        if emptied {
            rooms.remove(room);
        }
    }

    /// Drop a connection from every room it joined; called on socket
    /// teardown.
    pub async fn leave_all(&self, connection: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }

    /// Deliver the identical payload once to every connection in the room
    /// whose owning identity is not excluded. Returns how many live
    /// connections accepted the event; an absent or empty room is a silent
    /// miss, not an error. No ordering is guaranteed between recipients.
    pub async fn broadcast(
        &self,
        room: &RoomId,
        event: &ServerEvent,
        exclude: &HashSet<String>,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for member in members.values() {
            if exclude.contains(member.identity.as_str()) {
                continue;
            }
            if member.push(event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn member_count(&self, room: &RoomId) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }
}
