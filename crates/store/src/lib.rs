//! # Parley Store Crate
//!
//! Domain entities and the persistence-collaborator boundary. The live-sync
//! core never talks to durable storage directly: it consumes the records this
//! crate hands out (a created/edited/deleted message with its routing data, a
//! chat's member list) and produces distribution events from them.
//!
//! Validation and authorization are enforced here, before any event can reach
//! the fanout engine. [`MemoryStore`] is the in-memory reference
//! implementation backing the dev server and the test suites; swapping in a
//! durable document store happens behind the same surface.

pub mod errors;
pub mod memory;
pub mod types;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use types::{
    Attachment, AttachmentKind, ChatSummary, CreateChatRequest, CreateMessageRequest, Message,
};
