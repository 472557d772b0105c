//! Local client state and the rules for applying live events to it.

use std::collections::{HashMap, HashSet};

use parley_realtime::ServerEvent;
use parley_store::Message;
use tracing::debug;

/// A badge entry: a message the user has not seen, in a chat that is not
/// open. Keyed by message id so duplicate deliveries collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message_id: String,
    pub chat_id: String,
}

/// Directive returned by [`ChatSession::open_chat`]: the caller must fetch
/// the full history for this chat from the store. Live events are never the
/// source of truth for history.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFetch {
    pub chat_id: String,
}

/// One client's local view of the chat system.
///
/// Events are applied one at a time (the transport wiring serializes them),
/// and every application rule is idempotent, so duplicate delivery and
/// replay are harmless.
#[derive(Debug, Default)]
pub struct ChatSession {
    open_chat: Option<String>,
    thread: Vec<Message>,
    notifications: HashMap<String, Notification>,
    typists: HashMap<String, HashSet<String>>,
    chat_list_stale: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound live event to local state.
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Connected | ServerEvent::Error { .. } => return,
            ServerEvent::MessageReceived { message } => self.on_message_received(message),
            ServerEvent::MessageEditedReceived { message } => self.on_message_edited(message),
            ServerEvent::MessageDeletedReceived { message_id, .. } => {
                self.on_message_deleted(message_id)
            }
            ServerEvent::Typing { chat_id, identity } => {
                self.typists
                    .entry(chat_id.clone())
                    .or_default()
                    .insert(identity.clone());
            }
            ServerEvent::StopTyping { chat_id, identity } => {
                if let Some(typists) = self.typists.get_mut(chat_id) {
                    typists.remove(identity);
                    if typists.is_empty() {
                        self.typists.remove(chat_id);
                    }
                }
            }
        }

        // recency ordering of the chat list is never maintained
        // incrementally; any live event schedules a summary re-fetch
        self.chat_list_stale = true;
    }

    fn on_message_received(&mut self, message: &Message) {
        if self.open_chat.as_deref() == Some(message.chat_id.as_str()) {
            if !self.thread.iter().any(|m| m.id == message.id) {
                self.thread.push(message.clone());
            }
            return;
        }

        // badge only; duplicate deliveries collapse on the message id
        self.notifications
            .entry(message.id.clone())
            .or_insert_with(|| Notification {
                message_id: message.id.clone(),
                chat_id: message.chat_id.clone(),
            });
    }

    fn on_message_edited(&mut self, message: &Message) {
        // absent ids are ignored; the edit shows up on the next full fetch
        if let Some(existing) = self.thread.iter_mut().find(|m| m.id == message.id) {
            *existing = message.clone();
        }
    }

    fn on_message_deleted(&mut self, message_id: &str) {
        self.thread.retain(|m| m.id != message_id);
    }

    /// Switch the open chat. Clears the open sequence, drops notifications
    /// that referenced the newly opened chat, and directs the caller to
    /// re-fetch its history; notifications for other chats are untouched.
    pub fn open_chat(&mut self, chat_id: &str) -> HistoryFetch {
        debug!(%chat_id, "opening chat");
        self.open_chat = Some(chat_id.to_string());
        self.thread.clear();
        self.notifications
            .retain(|_, notification| notification.chat_id != chat_id);
        HistoryFetch {
            chat_id: chat_id.to_string(),
        }
    }

    /// Install a fetched history. Ignored if the user already switched away.
    pub fn load_history(&mut self, chat_id: &str, messages: Vec<Message>) {
        if self.open_chat.as_deref() == Some(chat_id) {
            self.thread = messages;
        }
    }

    pub fn close_chat(&mut self) {
        self.open_chat = None;
        self.thread.clear();
    }

    /// Reads and clears the chat-list staleness flag. The caller re-fetches
    /// the authoritative summary list whenever this reports `true`.
    pub fn take_chat_list_refresh(&mut self) -> bool {
        std::mem::take(&mut self.chat_list_stale)
    }

    pub fn open_chat_id(&self) -> Option<&str> {
        self.open_chat.as_deref()
    }

    pub fn thread(&self) -> &[Message] {
        &self.thread
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.values()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    pub fn has_notification(&self, message_id: &str) -> bool {
        self.notifications.contains_key(message_id)
    }

    /// Whether anyone is currently typing in the given chat.
    pub fn is_typing(&self, chat_id: &str) -> bool {
        self.typists
            .get(chat_id)
            .map(|typists| !typists.is_empty())
            .unwrap_or(false)
    }
}
