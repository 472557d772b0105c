//! Explicit lifecycle for the live-event wiring.

use std::sync::Arc;

use parley_realtime::ServerEvent;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::session::ChatSession;

/// Owns the task that drains inbound live events into a [`ChatSession`].
///
/// Events resume one at a time against the shared session; the drain task is
/// never concurrent with itself, so application order matches arrival order
/// on this connection. Dropping the subscription detaches the handlers,
/// replacing ad-hoc per-render attach/detach.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Start draining `events` into `session` until the channel closes or
    /// the subscription is shut down.
    pub fn spawn(
        session: Arc<Mutex<ChatSession>>,
        mut events: mpsc::UnboundedReceiver<ServerEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                session.lock().await.apply(&event);
            }
        });
        Self { task }
    }

    /// Tear down the wiring. Events still queued are discarded; the next
    /// history fetch covers anything missed.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
