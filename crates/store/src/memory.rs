//! In-memory reference implementation of the collaborator boundary.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::types::{ChatSummary, CreateChatRequest, CreateMessageRequest, Message};

#[derive(Debug, Clone)]
struct ChatRecord {
    id: String,
    name: String,
    is_group: bool,
    members: Vec<String>,
    created_at: String,
    message_ids: Vec<String>,
    latest_message: Option<String>,
}

#[derive(Default)]
struct StoreInner {
    chats: HashMap<String, ChatRecord>,
    messages: HashMap<String, Message>,
}

/// Authoritative chat/message state behind the collaborator interface.
///
/// Every mutation validates and authorizes before touching state; callers
/// only hand records to the fanout engine after a mutation has returned `Ok`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chat with the given member identity set.
    pub async fn create_chat(&self, req: CreateChatRequest) -> StoreResult<ChatSummary> {
        if req.members.is_empty() {
            return Err(StoreError::validation("a chat needs at least one member"));
        }
        if req.name.trim().is_empty() {
            return Err(StoreError::validation("chat name must not be empty"));
        }

        let record = ChatRecord {
            id: cuid2::create_id(),
            name: req.name,
            is_group: req.is_group,
            members: req.members,
            created_at: chrono::Utc::now().to_rfc3339(),
            message_ids: Vec::new(),
            latest_message: None,
        };

        let mut inner = self.inner.write().await;
        let summary = summarize(&record, &inner.messages);
        inner.chats.insert(record.id.clone(), record);
        Ok(summary)
    }

    /// Chat summaries for every chat the identity belongs to, most recent
    /// activity first.
    pub async fn list_chats(&self, identity: &str) -> Vec<ChatSummary> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<ChatSummary> = inner
            .chats
            .values()
            .filter(|chat| chat.members.iter().any(|m| m == identity))
            .map(|chat| summarize(chat, &inner.messages))
            .collect();

        summaries.sort_by(|a, b| recency_key(b).cmp(&recency_key(a)));
        summaries
    }

    /// Every chat in the store, for the dev console.
    pub async fn all_chats(&self) -> Vec<ChatSummary> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<ChatSummary> = inner
            .chats
            .values()
            .map(|chat| summarize(chat, &inner.messages))
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    /// The authoritative member identity set of a chat.
    pub async fn members_of(&self, chat_id: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.read().await;
        let chat = inner
            .chats
            .get(chat_id)
            .ok_or_else(|| StoreError::chat_not_found(chat_id))?;
        Ok(chat.members.clone())
    }

    /// Full ordered message history of a chat. Live events are never the
    /// source of truth for history; clients call this on every chat open.
    pub async fn history(&self, chat_id: &str, identity: &str) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let chat = inner
            .chats
            .get(chat_id)
            .ok_or_else(|| StoreError::chat_not_found(chat_id))?;
        check_membership(chat, identity)?;

        let messages = chat
            .message_ids
            .iter()
            .filter_map(|id| inner.messages.get(id))
            .map(|message| with_members(message, chat))
            .collect();
        Ok(messages)
    }

    /// Persist a new message and update the chat's latest-message reference.
    pub async fn create_message(
        &self,
        identity: &str,
        req: CreateMessageRequest,
    ) -> StoreResult<Message> {
        if req.chat_id.trim().is_empty() {
            return Err(StoreError::validation("missing chat reference"));
        }

        let content = req
            .content
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if content.is_none() && req.attachment.is_none() {
            return Err(StoreError::validation(
                "a message needs text content or an attachment",
            ));
        }

        let mut inner = self.inner.write().await;
        let chat = inner
            .chats
            .get(&req.chat_id)
            .ok_or_else(|| StoreError::chat_not_found(&req.chat_id))?;
        check_membership(chat, identity)?;

        let message = Message {
            id: cuid2::create_id(),
            chat_id: req.chat_id.clone(),
            sender_id: identity.to_string(),
            content,
            attachment: req.attachment,
            edited: false,
            created_at: chrono::Utc::now().to_rfc3339(),
            members: chat.members.clone(),
        };

        let chat = inner
            .chats
            .get_mut(&req.chat_id)
            .ok_or_else(|| StoreError::chat_not_found(&req.chat_id))?;
        chat.message_ids.push(message.id.clone());
        chat.latest_message = Some(message.id.clone());
        inner.messages.insert(message.id.clone(), message.clone());

        debug!(message_id = %message.id, chat_id = %message.chat_id, "message created");
        Ok(message)
    }

    /// Replace a message's content. Only the sender may edit.
    pub async fn edit_message(
        &self,
        identity: &str,
        message_id: &str,
        content: String,
    ) -> StoreResult<Message> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(StoreError::validation("edited content must not be empty"));
        }

        let mut inner = self.inner.write().await;
        let message = inner
            .messages
            .get_mut(message_id)
            .ok_or_else(|| StoreError::message_not_found(message_id))?;
        if message.sender_id != identity {
            return Err(StoreError::authorization(
                "cannot edit someone else's message",
            ));
        }

        message.content = Some(content);
        message.edited = true;
        let updated = message.clone();

        let chat = inner
            .chats
            .get(&updated.chat_id)
            .ok_or_else(|| StoreError::chat_not_found(&updated.chat_id))?;
        Ok(with_members(&updated, chat))
    }

    /// Remove a message. Only the sender may delete. Returns the removed
    /// record so the caller has the routing data for fanout.
    pub async fn delete_message(&self, identity: &str, message_id: &str) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;
        let sender_id = inner
            .messages
            .get(message_id)
            .map(|message| message.sender_id.clone())
            .ok_or_else(|| StoreError::message_not_found(message_id))?;
        if sender_id != identity {
            return Err(StoreError::authorization(
                "cannot delete someone else's message",
            ));
        }

        let removed = inner
            .messages
            .remove(message_id)
            .ok_or_else(|| StoreError::message_not_found(message_id))?;

        let chat = inner
            .chats
            .get_mut(&removed.chat_id)
            .ok_or_else(|| StoreError::chat_not_found(&removed.chat_id))?;
        chat.message_ids.retain(|id| id != message_id);
        if chat.latest_message.as_deref() == Some(message_id) {
            chat.latest_message = chat.message_ids.last().cloned();
        }
        let populated = with_members(&removed, chat);

        debug!(message_id = %populated.id, chat_id = %populated.chat_id, "message deleted");
        Ok(populated)
    }
}

fn check_membership(chat: &ChatRecord, identity: &str) -> StoreResult<()> {
    if chat.members.iter().any(|m| m == identity) {
        Ok(())
    } else {
        Err(StoreError::access_denied("not a member of this chat"))
    }
}

fn with_members(message: &Message, chat: &ChatRecord) -> Message {
    let mut message = message.clone();
    message.members = chat.members.clone();
    message
}

fn summarize(chat: &ChatRecord, messages: &HashMap<String, Message>) -> ChatSummary {
    let latest_message = chat
        .latest_message
        .as_ref()
        .and_then(|id| messages.get(id))
        .map(|message| with_members(message, chat));

    ChatSummary {
        id: chat.id.clone(),
        name: chat.name.clone(),
        is_group: chat.is_group,
        members: chat.members.clone(),
        latest_message,
        created_at: chat.created_at.clone(),
    }
}

fn recency_key(summary: &ChatSummary) -> String {
    summary
        .latest_message
        .as_ref()
        .map(|message| message.created_at.clone())
        .unwrap_or_else(|| summary.created_at.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, AttachmentKind};

    async fn seed_chat(store: &MemoryStore, members: &[&str]) -> ChatSummary {
        store
            .create_chat(CreateChatRequest {
                name: "general".to_string(),
                is_group: members.len() > 2,
                members: members.iter().map(|m| m.to_string()).collect(),
            })
            .await
            .expect("create chat")
    }

    fn text_message(chat_id: &str, content: &str) -> CreateMessageRequest {
        CreateMessageRequest {
            chat_id: chat_id.to_string(),
            content: Some(content.to_string()),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_create_message_updates_latest() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;

        let message = store
            .create_message("alice", text_message(&chat.id, "hello"))
            .await
            .expect("create message");

        assert_eq!(message.sender_id, "alice");
        assert_eq!(message.members, vec!["alice", "bob"]);
        assert!(!message.edited);

        let chats = store.list_chats("bob").await;
        assert_eq!(chats.len(), 1);
        let latest = chats[0].latest_message.as_ref().expect("latest message");
        assert_eq!(latest.id, message.id);
    }

    #[tokio::test]
    async fn test_create_message_requires_content_or_attachment() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;

        let result = store
            .create_message(
                "alice",
                CreateMessageRequest {
                    chat_id: chat.id.clone(),
                    content: Some("   ".to_string()),
                    attachment: None,
                },
            )
            .await;

        assert!(matches!(result, Err(StoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_attachment_only_message_is_valid() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;

        let message = store
            .create_message(
                "alice",
                CreateMessageRequest {
                    chat_id: chat.id.clone(),
                    content: None,
                    attachment: Some(Attachment {
                        kind: AttachmentKind::Image,
                        url: "/uploads/cat.png".to_string(),
                        name: "cat.png".to_string(),
                        size: 2048,
                    }),
                },
            )
            .await
            .expect("create attachment message");

        assert!(message.content.is_none());
        assert_eq!(
            message.attachment.as_ref().map(|a| a.kind),
            Some(AttachmentKind::Image)
        );
    }

    #[tokio::test]
    async fn test_create_message_requires_membership() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;

        let result = store
            .create_message("mallory", text_message(&chat.id, "hi"))
            .await;

        assert!(matches!(result, Err(StoreError::AccessDenied { .. })));
    }

    #[tokio::test]
    async fn test_create_message_unknown_chat() {
        let store = MemoryStore::new();

        let result = store
            .create_message("alice", text_message("nope", "hi"))
            .await;

        assert!(matches!(result, Err(StoreError::ChatNotFound { .. })));
    }

    #[tokio::test]
    async fn test_edit_message_owner_only() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;
        let message = store
            .create_message("alice", text_message(&chat.id, "hello"))
            .await
            .expect("create message");

        let result = store
            .edit_message("bob", &message.id, "hijacked".to_string())
            .await;
        assert!(matches!(result, Err(StoreError::Authorization { .. })));

        let updated = store
            .edit_message("alice", &message.id, "hello world".to_string())
            .await
            .expect("edit own message");
        assert_eq!(updated.content.as_deref(), Some("hello world"));
        assert!(updated.edited);
    }

    #[tokio::test]
    async fn test_delete_message_owner_only() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;
        let message = store
            .create_message("alice", text_message(&chat.id, "hello"))
            .await
            .expect("create message");

        let result = store.delete_message("bob", &message.id).await;
        assert!(matches!(result, Err(StoreError::Authorization { .. })));

        let removed = store
            .delete_message("alice", &message.id)
            .await
            .expect("delete own message");
        assert_eq!(removed.id, message.id);
        assert_eq!(removed.members, vec!["alice", "bob"]);

        let history = store.history(&chat.id, "alice").await.expect("history");
        assert!(history.is_empty());

        let chats = store.list_chats("alice").await;
        assert!(chats[0].latest_message.is_none());
    }

    #[tokio::test]
    async fn test_history_requires_membership_and_preserves_order() {
        let store = MemoryStore::new();
        let chat = seed_chat(&store, &["alice", "bob"]).await;

        store
            .create_message("alice", text_message(&chat.id, "first"))
            .await
            .expect("create first");
        store
            .create_message("bob", text_message(&chat.id, "second"))
            .await
            .expect("create second");

        let denied = store.history(&chat.id, "mallory").await;
        assert!(matches!(denied, Err(StoreError::AccessDenied { .. })));

        let history = store.history(&chat.id, "bob").await.expect("history");
        let contents: Vec<_> = history
            .iter()
            .filter_map(|m| m.content.as_deref())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_list_chats_orders_by_recent_activity() {
        let store = MemoryStore::new();
        let quiet = seed_chat(&store, &["alice", "bob"]).await;
        let busy = store
            .create_chat(CreateChatRequest {
                name: "busy".to_string(),
                is_group: false,
                members: vec!["alice".to_string(), "carol".to_string()],
            })
            .await
            .expect("create chat");

        store
            .create_message("alice", text_message(&busy.id, "ping"))
            .await
            .expect("create message");

        let chats = store.list_chats("alice").await;
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, busy.id);
        assert_eq!(chats[1].id, quiet.id);
    }

    #[tokio::test]
    async fn test_members_of_unknown_chat() {
        let store = MemoryStore::new();
        let result = store.members_of("missing").await;
        assert!(matches!(result, Err(StoreError::ChatNotFound { .. })));
    }
}
