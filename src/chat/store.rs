//! Chat state store: single-writer state with mutate-then-notify.
//!
//! The store is the one shared mutable resource of the chat core. All
//! mutations go through [`ChatStore::apply`]; every successful mutation
//! broadcasts a full snapshot so consumers never observe a torn state.
//!
//! The store also owns the active stream generation counter. Chunk
//! application from a spawned pump goes through [`ChatStore::apply_if_current`],
//! which checks the chunk's generation tag against the current one under the
//! same lock that guards the state, so a canceled stream's late chunks can
//! never land.

use std::sync::Mutex;

use tokio::sync::broadcast;

use super::state::{ChatState, ChatUpdate};

const CHANNEL_CAPACITY: usize = 256;

struct StoreInner {
    state: ChatState,
    /// Generation of the currently active stream; bumped on every new
    /// stream and on cancellation.
    generation: u64,
}

/// Observer handle for state snapshots.
pub struct StateReceiver {
    rx: broadcast::Receiver<ChatState>,
}

impl StateReceiver {
    /// Receive the next snapshot.
    pub async fn recv(&mut self) -> Result<ChatState, StoreError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => StoreError::Closed,
            broadcast::error::RecvError::Lagged(n) => StoreError::Lagged(n),
        })
    }

    /// Receive a snapshot without waiting, if one is queued.
    pub fn try_recv(&mut self) -> Result<Option<ChatState>, StoreError> {
        match self.rx.try_recv() {
            Ok(state) => Ok(Some(state)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(StoreError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(StoreError::Lagged(n)),
        }
    }
}

/// Subscription errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store closed")]
    Closed,
    #[error("Lagged behind by {0} snapshots")]
    Lagged(u64),
}

/// The chat state store.
pub struct ChatStore {
    inner: Mutex<StoreInner>,
    tx: broadcast::Sender<ChatState>,
}

impl ChatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(StoreInner {
                state: ChatState::default(),
                generation: 0,
            }),
            tx,
        }
    }

    /// Apply a batch of updates as one observable mutation.
    ///
    /// Subscribers see a single snapshot covering the whole batch.
    pub fn apply_all(&self, updates: impl IntoIterator<Item = ChatUpdate>) {
        let snapshot = {
            let mut inner = self.lock();
            for update in updates {
                inner.state.apply(update);
            }
            inner.state.clone()
        };
        // No subscribers is fine.
        let _ = self.tx.send(snapshot);
    }

    /// Apply a single update and notify subscribers.
    pub fn apply(&self, update: ChatUpdate) {
        self.apply_all([update]);
    }

    /// Apply updates only if `generation` is still the active stream
    /// generation. Returns whether the updates were applied.
    pub fn apply_if_current(
        &self,
        generation: u64,
        updates: impl IntoIterator<Item = ChatUpdate>,
    ) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return false;
            }
            for update in updates {
                inner.state.apply(update);
            }
            inner.state.clone()
        };
        let _ = self.tx.send(snapshot);
        true
    }

    /// Start a new stream generation and return its tag.
    pub fn next_generation(&self) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.generation
    }

    /// Invalidate the active generation so tagged applies stop landing.
    pub fn invalidate_generation(&self) {
        self.lock().generation += 1;
    }

    /// Read a consistent snapshot of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.lock().state.clone()
    }

    /// Subscribe to snapshots emitted after each mutation.
    pub fn subscribe(&self) -> StateReceiver {
        StateReceiver {
            rx: self.tx.subscribe(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        // A poisoned lock means a panic mid-mutation; the state itself is
        // updated through infallible `apply` calls, so keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{ChatMessage, MessageStatus};
    use crate::chat::state::ChatStatus;

    #[test]
    fn snapshot_reflects_applied_updates() {
        let store = ChatStore::new();
        store.apply(ChatUpdate::AppendMessage(ChatMessage::user("hi", vec![])));
        store.apply(ChatUpdate::SetStatus(ChatStatus::Sending));

        let snap = store.snapshot();
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.status, ChatStatus::Sending);
    }

    #[test]
    fn subscribers_get_one_snapshot_per_mutation() {
        let store = ChatStore::new();
        let mut rx = store.subscribe();

        store.apply_all([
            ChatUpdate::AppendMessage(ChatMessage::user("hi", vec![])),
            ChatUpdate::SetStatus(ChatStatus::Sending),
        ]);

        let snap = rx.try_recv().unwrap().unwrap();
        assert_eq!(snap.messages.len(), 1);
        assert_eq!(snap.status, ChatStatus::Sending);
        // The batch was one mutation, so exactly one snapshot.
        assert!(rx.try_recv().unwrap().is_none());
    }

    #[test]
    fn apply_without_subscribers_does_not_panic() {
        let store = ChatStore::new();
        store.apply(ChatUpdate::SetStatus(ChatStatus::Sending));
    }

    #[test]
    fn stale_generation_is_rejected() {
        let store = ChatStore::new();
        let msg = ChatMessage::assistant();
        let id = msg.id.clone();
        store.apply(ChatUpdate::AppendMessage(msg));

        let generation = store.next_generation();
        assert!(store.apply_if_current(
            generation,
            [ChatUpdate::SetMessageStatus {
                message_id: id.clone(),
                status: MessageStatus::Streaming,
            }],
        ));

        store.invalidate_generation();

        assert!(!store.apply_if_current(
            generation,
            [ChatUpdate::AppendChunk {
                message_id: id.clone(),
                text: "late".into(),
            }],
        ));
        assert!(store.snapshot().message(&id).unwrap().content.is_empty());
    }

    #[test]
    fn generations_are_monotonic() {
        let store = ChatStore::new();
        let g1 = store.next_generation();
        let g2 = store.next_generation();
        assert!(g2 > g1);
        store.invalidate_generation();
        let g3 = store.next_generation();
        assert!(g3 > g2);
    }

    #[tokio::test]
    async fn recv_delivers_snapshots_in_order() {
        let store = ChatStore::new();
        let mut rx = store.subscribe();

        store.apply(ChatUpdate::SetStatus(ChatStatus::Sending));
        store.apply(ChatUpdate::SetStatus(ChatStatus::Streaming));

        assert_eq!(rx.recv().await.unwrap().status, ChatStatus::Sending);
        assert_eq!(rx.recv().await.unwrap().status, ChatStatus::Streaming);
    }

    #[tokio::test]
    async fn recv_reports_closed_store() {
        let store = ChatStore::new();
        let mut rx = store.subscribe();
        drop(store);

        assert!(matches!(rx.recv().await, Err(StoreError::Closed)));
    }
}
