//! # Parley Client Crate
//!
//! The reconciliation layer a chat client runs against the live-sync
//! protocol: it owns the open-thread sequence, the notification set, and the
//! typing indicator, and applies inbound [`ServerEvent`]s to them one at a
//! time.
//!
//! All state lives in an explicit [`ChatSession`] injected into the event
//! path; nothing is captured from globals, so the layer is instantiable and
//! testable on its own. The [`Subscription`] type gives the event wiring an
//! explicit lifecycle: created when a chat view opens, torn down when it
//! closes.

pub mod session;
pub mod subscription;

pub use session::{ChatSession, HistoryFetch, Notification};
pub use subscription::Subscription;
