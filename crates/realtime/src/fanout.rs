//! Turns domain events into broadcasts with computed recipient sets.

use std::collections::HashSet;
use std::sync::Arc;

use parley_store::Message;
use tracing::{debug, warn};

use crate::events::ServerEvent;
use crate::rooms::{RoomId, RoomRouter};

/// Domain events accepted by the fanout engine. Each one corresponds to a
/// mutation that already succeeded at the persistence boundary, or to a
/// typing-state transition; a failed mutation never produces one of these.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    MessageCreated {
        message: Message,
    },
    MessageEdited {
        message: Message,
    },
    MessageDeleted {
        message_id: String,
        chat_id: String,
        members: Vec<String>,
        actor_id: String,
    },
    TypingStarted {
        chat_id: String,
        identity: String,
    },
    TypingStopped {
        chat_id: String,
        identity: String,
    },
}

/// Stateless dispatcher: one rule per domain event.
///
/// Message events go to each recipient's personal room so delivery succeeds
/// whether or not the recipient has the chat open; typing events go to the
/// chat room since only viewers care. Delivery is fire-and-forget: no
/// retries, no queues, and an identity with zero live connections simply
/// misses the event.
pub struct FanoutEngine {
    router: Arc<RoomRouter>,
}

impl FanoutEngine {
    pub fn new(router: Arc<RoomRouter>) -> Self {
        Self { router }
    }

    /// Dispatch one domain event. Returns how many live connections were
    /// reached, which is diagnostic only; a zero is not an error.
    pub async fn dispatch(&self, event: ChatEvent) -> usize {
        match event {
            ChatEvent::MessageCreated { message } => {
                let payload = ServerEvent::MessageReceived {
                    message: message.clone(),
                };
                self.to_mailboxes(&message.chat_id, &message.members, &message.sender_id, payload)
                    .await
            }
            ChatEvent::MessageEdited { message } => {
                let payload = ServerEvent::MessageEditedReceived {
                    message: message.clone(),
                };
                self.to_mailboxes(&message.chat_id, &message.members, &message.sender_id, payload)
                    .await
            }
            ChatEvent::MessageDeleted {
                message_id,
                chat_id,
                members,
                actor_id,
            } => {
                let payload = ServerEvent::MessageDeletedReceived {
                    message_id,
                    chat_id: chat_id.clone(),
                };
                self.to_mailboxes(&chat_id, &members, &actor_id, payload).await
            }
            ChatEvent::TypingStarted { chat_id, identity } => {
                let payload = ServerEvent::Typing {
                    chat_id: chat_id.clone(),
                    identity: identity.clone(),
                };
                self.to_chat_room(chat_id, identity, payload).await
            }
            ChatEvent::TypingStopped { chat_id, identity } => {
                let payload = ServerEvent::StopTyping {
                    chat_id: chat_id.clone(),
                    identity: identity.clone(),
                };
                self.to_chat_room(chat_id, identity, payload).await
            }
        }
    }

    /// Deliver to the personal room of every member except the actor. The
    /// exclusion is a single set difference, not a per-recipient check.
    async fn to_mailboxes(
        &self,
        chat_id: &str,
        members: &[String],
        actor: &str,
        payload: ServerEvent,
    ) -> usize {
        if members.is_empty() {
            warn!(%chat_id, "chat event carried no member list, dropping");
            return 0;
        }

        let recipients = recipients_of(members, actor);
        let exclude = HashSet::new();
        let mut delivered = 0;
        for identity in &recipients {
            let room = RoomId::Personal((*identity).to_string());
            delivered += self.router.broadcast(&room, &payload, &exclude).await;
        }

        debug!(
            %chat_id,
            recipients = recipients.len(),
            delivered,
            "message event fanned out"
        );
        delivered
    }

    /// Typing is only interesting to connections currently viewing the chat.
    async fn to_chat_room(&self, chat_id: String, typist: String, payload: ServerEvent) -> usize {
        let exclude = HashSet::from([typist]);
        self.router
            .broadcast(&RoomId::Chat(chat_id), &payload, &exclude)
            .await
    }
}

/// `members \ {actor}`, computed once per event.
fn recipients_of<'a>(members: &'a [String], actor: &str) -> HashSet<&'a str> {
    let mut recipients: HashSet<&str> = members.iter().map(String::as_str).collect();
    recipients.remove(actor);
    recipients
}
