//! Message and chat entity definitions

use serde::{Deserialize, Serialize};

/// One persisted chat message.
///
/// The member list of the owning chat is denormalized onto the record when it
/// is handed out, so the fanout engine can compute a distribution set without
/// a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
    pub edited: bool,
    pub created_at: String,
    /// Member identities of the owning chat at the time the record was read.
    pub members: Vec<String>,
}

/// File attachment metadata carried on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: String,
    pub name: String,
    pub size: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Document => "document",
            AttachmentKind::Other => "other",
        }
    }
}

/// Summary used for ordering the chat list; the authoritative copy lives in
/// the store and clients refresh it on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub name: String,
    pub is_group: bool,
    pub members: Vec<String>,
    pub latest_message: Option<Message>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
    pub is_group: bool,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub chat_id: String,
    pub content: Option<String>,
    pub attachment: Option<Attachment>,
}
