//! Wire-event types for the live-sync protocol.

use parley_store::Message;
use serde::{Deserialize, Serialize};

/// Client events received over the live transport.
///
/// The message relays (`message_created` and friends) are sent by clients
/// *after* the corresponding mutation succeeded against the persistence
/// collaborator; they carry the routing data the fanout engine needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Registers this connection for an identity. Must be the first frame.
    Setup { identity: String },
    /// Join a chat room to receive chat-room-scoped typing events.
    JoinRoom { chat_id: String },
    /// Content-change signal while composing in a chat.
    Typing { chat_id: String },
    /// Explicit stop (message sent, input cleared).
    StopTyping { chat_id: String },
    /// A message was persisted; distribute it.
    MessageCreated { message: Message },
    /// An edit was persisted; distribute it.
    MessageEdited { message: Message },
    /// A delete was persisted; distribute it.
    MessageDeleted {
        message_id: String,
        chat_id: String,
        members: Vec<String>,
        actor_id: String,
    },
}

/// Server events delivered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges setup.
    Connected,
    /// Someone started typing in a chat this connection is viewing.
    Typing { chat_id: String, identity: String },
    /// The typist went quiet or sent their message.
    StopTyping { chat_id: String, identity: String },
    /// New message for one of this identity's chats.
    MessageReceived { message: Message },
    /// A message this identity may hold locally was edited.
    MessageEditedReceived { message: Message },
    /// A message this identity may hold locally was deleted.
    MessageDeletedReceived { message_id: String, chat_id: String },
    /// Error response
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_use_snake_case_tags() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"typing","chat_id":"c1"}"#).expect("parse typing");
        assert!(matches!(event, ClientEvent::Typing { chat_id } if chat_id == "c1"));

        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"message_deleted","message_id":"m1","chat_id":"c1","members":["a","b"],"actor_id":"a"}"#,
        )
        .expect("parse message_deleted");
        assert!(matches!(event, ClientEvent::MessageDeleted { ref actor_id, .. } if actor_id == "a"));
    }

    #[test]
    fn server_events_round_trip() {
        let event = ServerEvent::MessageDeletedReceived {
            message_id: "m1".to_string(),
            chat_id: "c1".to_string(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains(r#""type":"message_deleted_received""#));
    }
}
