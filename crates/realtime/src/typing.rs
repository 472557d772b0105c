//! Typing debounce state machine.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// How long a typist may stay quiet before the indicator is retired.
pub const DEFAULT_TYPING_IDLE: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingPhase {
    Idle,
    Typing,
}

/// Edge reported by the tracker. Only edges reach the fanout engine; repeat
/// signals while already typing report nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingTransition {
    Started,
    Stopped,
}

#[derive(Debug)]
struct TypingEntry {
    phase: TypingPhase,
    last_activity: Instant,
}

/// Per-(chat, identity) typing state. Entries are created lazily on the
/// first keystroke signal and never persisted.
///
/// Expiry is lazy: a deferred check is scheduled after each promotion and
/// simply observes the activity timestamp when it fires. Nothing is
/// cancelled or rescheduled, so several checks may be in flight at once;
/// only the ones that see true inactivity demote, and demotion is
/// idempotent.
pub struct TypingTracker {
    idle_timeout: Duration,
    entries: Mutex<HashMap<(String, String), TypingEntry>>,
}

impl TypingTracker {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Content-change signal. Refreshes the activity timestamp on every call
    /// and reports the Idle -> Typing edge exactly once.
    pub async fn signal(&self, chat_id: &str, identity: &str) -> Option<TypingTransition> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry((chat_id.to_string(), identity.to_string()))
            .or_insert_with(|| TypingEntry {
                phase: TypingPhase::Idle,
                last_activity: Instant::now(),
            });

        entry.last_activity = Instant::now();
        match entry.phase {
            TypingPhase::Idle => {
                entry.phase = TypingPhase::Typing;
                Some(TypingTransition::Started)
            }
            TypingPhase::Typing => None,
        }
    }

    /// Explicit stop (the message was sent). Idempotent.
    pub async fn stop(&self, chat_id: &str, identity: &str) -> Option<TypingTransition> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(&(chat_id.to_string(), identity.to_string())) {
            Some(entry) if entry.phase == TypingPhase::Typing => {
                entry.phase = TypingPhase::Idle;
                Some(TypingTransition::Stopped)
            }
            _ => None,
        }
    }

    /// Deferred inactivity check, evaluated `idle_timeout` after a signal.
    /// A signal that renewed the timestamp in the meantime makes this a
    /// no-op; the still-pending duplicate checks are harmless.
    pub async fn expire_check(&self, chat_id: &str, identity: &str) -> Option<TypingTransition> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(&(chat_id.to_string(), identity.to_string()))?;

        if entry.phase == TypingPhase::Typing && entry.last_activity.elapsed() >= self.idle_timeout
        {
            entry.phase = TypingPhase::Idle;
            return Some(TypingTransition::Stopped);
        }
        None
    }

    pub async fn phase(&self, chat_id: &str, identity: &str) -> TypingPhase {
        let entries = self.entries.lock().await;
        entries
            .get(&(chat_id.to_string(), identity.to_string()))
            .map(|entry| entry.phase)
            .unwrap_or(TypingPhase::Idle)
    }
}

impl Default for TypingTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_IDLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn burst_of_signals_reports_one_started_edge() {
        let tracker = TypingTracker::default();

        let mut edges = 0;
        for _ in 0..10 {
            if tracker.signal("c1", "alice").await.is_some() {
                edges += 1;
            }
            advance(Duration::from_millis(100)).await;
        }

        assert_eq!(edges, 1);
        assert_eq!(tracker.phase("c1", "alice").await, TypingPhase::Typing);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_expires_to_exactly_one_stop() {
        let tracker = TypingTracker::default();
        tracker.signal("c1", "alice").await;

        advance(DEFAULT_TYPING_IDLE).await;

        assert_eq!(
            tracker.expire_check("c1", "alice").await,
            Some(TypingTransition::Stopped)
        );
        // a second overlapping check observes the demotion already happened
        assert_eq!(tracker.expire_check("c1", "alice").await, None);
        assert_eq!(tracker.phase("c1", "alice").await, TypingPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn renewed_activity_defeats_a_pending_check() {
        let tracker = TypingTracker::default();
        tracker.signal("c1", "alice").await;

        advance(Duration::from_millis(2_000)).await;
        tracker.signal("c1", "alice").await;
        advance(Duration::from_millis(1_500)).await;

        // the first check fires 3s after the first signal, but activity was
        // renewed 1.5s ago
        assert_eq!(tracker.expire_check("c1", "alice").await, None);
        assert_eq!(tracker.phase("c1", "alice").await, TypingPhase::Typing);

        advance(Duration::from_millis(1_500)).await;
        assert_eq!(
            tracker.expire_check("c1", "alice").await,
            Some(TypingTransition::Stopped)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_stop_is_idempotent() {
        let tracker = TypingTracker::default();
        tracker.signal("c1", "alice").await;

        assert_eq!(
            tracker.stop("c1", "alice").await,
            Some(TypingTransition::Stopped)
        );
        assert_eq!(tracker.stop("c1", "alice").await, None);
        assert_eq!(tracker.stop("c1", "bob").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn chats_and_identities_are_tracked_independently() {
        let tracker = TypingTracker::default();

        assert!(tracker.signal("c1", "alice").await.is_some());
        assert!(tracker.signal("c2", "alice").await.is_some());
        assert!(tracker.signal("c1", "bob").await.is_some());

        tracker.stop("c1", "alice").await;
        assert_eq!(tracker.phase("c1", "alice").await, TypingPhase::Idle);
        assert_eq!(tracker.phase("c2", "alice").await, TypingPhase::Typing);
        assert_eq!(tracker.phase("c1", "bob").await, TypingPhase::Typing);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_after_expiry_reports_a_fresh_edge() {
        let tracker = TypingTracker::default();
        tracker.signal("c1", "alice").await;

        advance(DEFAULT_TYPING_IDLE).await;
        tracker.expire_check("c1", "alice").await;

        assert_eq!(
            tracker.signal("c1", "alice").await,
            Some(TypingTransition::Started)
        );
    }
}
