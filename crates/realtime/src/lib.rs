//! # Parley Realtime Crate
//!
//! The live-sync engine: tracks which identities are reachable, routes
//! message events and typing signals to the correct recipients, and defines
//! the wire events clients reconcile against.
//!
//! ## Architecture
//!
//! - **Registry**: live transport connections per identity; derives presence
//! - **Rooms**: join/leave of connections into delivery rooms; the broadcast
//!   primitive
//! - **Fanout**: one rule per domain event, distribution computed as
//!   `members \ {actor}`
//! - **Typing**: per-(chat, identity) debounce state machine with deferred
//!   inactivity checks
//!
//! Delivery is best-effort and at most once per live connection: nothing is
//! queued for offline identities, nothing is retried. Durability lives with
//! the persistence collaborator, which clients re-fetch on chat open.

pub mod events;
pub mod fanout;
pub mod registry;
pub mod rooms;
pub mod typing;

pub use events::{ClientEvent, ServerEvent};
pub use fanout::{ChatEvent, FanoutEngine};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, PresenceChange};
pub use rooms::{RoomId, RoomRouter};
pub use typing::{TypingPhase, TypingTracker, TypingTransition, DEFAULT_TYPING_IDLE};
