//! Session store.
//!
//! Holds the [`SessionState`] as one value and notifies subscribers
//! synchronously after every committed change, in registration order.
//! Listeners may read [`SessionStore::state`] but must not mutate the store
//! or change subscriptions while being notified.

use crate::session::{PlayerId, RoomId, SessionState};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strictly_gomoku::{GameView, GomokuInvariants, InvariantSet};
use tracing::{debug, error, instrument, warn};

/// Callback invoked with the new state after each commit.
pub type Listener = Box<dyn FnMut(&SessionState) + Send>;

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("subscription-{}", _0)]
pub struct SubscriptionId(u64);

struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

/// Single owner of the session state.
pub struct SessionStore {
    state: Mutex<Arc<SessionState>>,
    subscribers: Mutex<Subscribers>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .field("subscribers", &self.lock_subscribers().entries.len())
            .finish()
    }
}

impl SessionStore {
    /// Creates a store holding `initial`.
    pub fn new(initial: SessionState) -> Self {
        Self {
            state: Mutex::new(Arc::new(initial)),
            subscribers: Mutex::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }

    /// Creates a store with a fresh waiting session.
    pub fn for_room(room_id: RoomId, local_player: PlayerId) -> Self {
        Self::new(SessionState::fresh(room_id, local_player))
    }

    fn lock_state(&self) -> MutexGuard<'_, Arc<SessionState>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Immutable snapshot; later commits do not affect it.
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.lock_state())
    }

    /// Registers a listener.
    pub fn subscribe(&self, listener: impl FnMut(&SessionState) + Send + 'static) -> SubscriptionId {
        let mut subscribers = self.lock_subscribers();
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.entries.push((id, Box::new(listener)));
        debug!(%id, "Listener subscribed");
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.entries.len();
        subscribers.entries.retain(|(entry, _)| *entry != id);
        let removed = subscribers.entries.len() != before;
        debug!(%id, removed, "Listener unsubscribed");
        removed
    }

    /// Applies an infallible mutation and notifies.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let outcome: Result<(), std::convert::Infallible> = self.transact(|state| {
            f(state);
            Ok(())
        });
        let Ok(()) = outcome;
    }

    /// Applies a fallible mutation to a working copy.
    ///
    /// On `Ok` the copy is committed and subscribers are notified once; on
    /// `Err` nothing changes and nobody is notified.
    pub fn transact<T, E>(&self, f: impl FnOnce(&mut SessionState) -> Result<T, E>) -> Result<T, E> {
        let committed = {
            let mut guard = self.lock_state();
            let mut working = SessionState::clone(&guard);
            let value = f(&mut working)?;
            let committed = Arc::new(working);
            *guard = Arc::clone(&committed);
            (value, committed)
        };
        let (value, state) = committed;
        check_invariants(&state);
        self.notify(&state);
        Ok(value)
    }

    /// Replaces the state with a fresh waiting session and notifies.
    ///
    /// The connection state carries over; it belongs to the channel.
    #[instrument(skip(self))]
    pub fn reset(&self, room_id: RoomId, local_player: PlayerId) {
        self.update(|state| {
            let connection = state.connection;
            *state = SessionState::fresh(room_id, local_player);
            state.connection = connection;
        });
    }

    fn notify(&self, state: &SessionState) {
        let mut subscribers = self.lock_subscribers();
        for (id, listener) in subscribers.entries.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| listener(state)));
            if let Err(panic) = result {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(%id, %message, "Listener panicked; continuing with remaining listeners");
            }
        }
    }
}

fn check_invariants(state: &SessionState) {
    let view = GameView::new(state.board(), state.session().turn());
    if let Err(violations) = GomokuInvariants::check_all(&view) {
        for violation in violations {
            warn!(description = %violation.description, "Invariant violated after commit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> SessionStore {
        SessionStore::for_room(RoomId::new("r"), PlayerId::new("alice"))
    }

    fn counter(store: &SessionStore) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_snapshot_is_immutable() {
        let store = store();
        let before = store.state();
        store.update(|state| state.session.set_room_status("PLAYING".into()));
        assert_eq!(before.session().room_status(), None);
        assert_eq!(store.state().session().room_status(), Some("PLAYING"));
    }

    #[test]
    fn test_failed_transaction_does_not_commit_or_notify() {
        let store = store();
        let count = counter(&store);
        let result: Result<(), &str> = store.transact(|state| {
            state.session.set_room_status("DIRTY".into());
            Err("boom")
        });
        assert!(result.is_err());
        assert_eq!(store.state().session().room_status(), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_notification_order() {
        let store = store();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            store.subscribe(move |_| order.lock().expect("lock").push(n));
        }
        store.update(|_| {});
        assert_eq!(*order.lock().expect("lock"), vec![0, 1, 2]);
    }

    #[test]
    fn test_reset_keeps_connection() {
        let store = store();
        store.update(|state| {
            state.connection = crate::transport::ConnectionState::Connected;
            state.session.set_room_status("ENDED".into());
        });
        store.reset(RoomId::new("r2"), PlayerId::new("alice"));
        let state = store.state();
        assert_eq!(state.session().room_id(), &RoomId::new("r2"));
        assert_eq!(state.session().room_status(), None);
        assert_eq!(state.connection(), crate::transport::ConnectionState::Connected);
    }

    #[test]
    fn test_unsubscribe() {
        let store = store();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        store.update(|_| {});
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update(|_| {});
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let store = store();
        store.subscribe(|_| panic!("listener failure"));
        let count = counter(&store);
        store.update(|_| {});
        store.update(|_| {});
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
