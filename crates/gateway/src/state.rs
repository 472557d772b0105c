//! Shared application state for the gateway

use std::sync::Arc;
use std::time::Duration;

use parley_realtime::{ConnectionRegistry, FanoutEngine, RoomRouter, TypingTracker};
use parley_store::MemoryStore;

/// Shared state handed to every socket and REST handler. All fields are
/// owned by this single process; there is no cross-instance sharing.
#[derive(Clone)]
pub struct GatewayState {
    /// Persistence-collaborator boundary
    pub store: Arc<MemoryStore>,
    /// Live connections per identity
    pub registry: Arc<ConnectionRegistry>,
    /// Room membership and the broadcast primitive
    pub router: Arc<RoomRouter>,
    /// Per-(chat, identity) typing state
    pub typing: Arc<TypingTracker>,
    /// Domain-event dispatcher
    pub fanout: Arc<FanoutEngine>,
}

impl GatewayState {
    pub fn new(store: Arc<MemoryStore>, typing_idle: Duration) -> Self {
        let router = Arc::new(RoomRouter::new());
        Self {
            store,
            registry: Arc::new(ConnectionRegistry::new()),
            fanout: Arc::new(FanoutEngine::new(router.clone())),
            router,
            typing: Arc::new(TypingTracker::new(typing_idle)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_realtime::DEFAULT_TYPING_IDLE;

    #[tokio::test]
    async fn state_is_cheaply_cloneable_and_shares_the_engine() {
        let state = GatewayState::new(Arc::new(MemoryStore::new()), DEFAULT_TYPING_IDLE);
        let clone = state.clone();

        assert!(Arc::ptr_eq(&state.registry, &clone.registry));
        assert!(Arc::ptr_eq(&state.router, &clone.router));
        assert!(Arc::ptr_eq(&state.typing, &clone.typing));
    }
}
