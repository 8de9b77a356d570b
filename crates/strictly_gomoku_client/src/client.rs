//! Session-scoped facade for one room.

use crate::bootstrap::{BootstrapSource, apply_bootstrap};
use crate::config::ClientConfig;
use crate::controller::OptimisticMoveController;
use crate::error::{BootstrapError, FrameError, SubmitError, TransportError};
use crate::protocol::decode;
use crate::reconciler::SyncReconciler;
use crate::session::{PlayerId, RoomId, SessionState};
use crate::store::SessionStore;
use crate::transport::{ConnectionState, RoomTopics, Transport};
use std::sync::Arc;
use strictly_gomoku::{Coord, Move};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Wires store, controller, reconciler and transport for one room.
///
/// Constructed per session and passed by reference; nothing here is global.
#[derive(Debug)]
pub struct GameClient<T> {
    config: ClientConfig,
    transport: T,
    store: SessionStore,
    controller: OptimisticMoveController,
    topics: RoomTopics,
}

impl<T: Transport> GameClient<T> {
    /// Creates a client in a fresh waiting session.
    #[instrument(skip(config, transport))]
    pub fn new(config: ClientConfig, transport: T, room_id: RoomId, local_player: PlayerId) -> Self {
        let topics = RoomTopics::for_room(&config, &room_id);
        let controller = OptimisticMoveController::from_config(&config);
        let mut state = SessionState::fresh(room_id, local_player);
        state.connection = *transport.connection().borrow();
        Self {
            config,
            transport,
            store: SessionStore::new(state),
            controller,
            topics,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Returns the topics of the current room.
    pub fn topics(&self) -> &RoomTopics {
        &self.topics
    }

    /// Immutable snapshot of the session.
    pub fn state(&self) -> Arc<SessionState> {
        self.store.state()
    }

    /// Subscribes to the room's game and room topics.
    #[instrument(skip(self), fields(room_id = %self.state().session().room_id()))]
    pub fn join(&self) -> Result<(), TransportError> {
        for topic in self.topics.topics() {
            self.transport.subscribe(topic)?;
        }
        info!("Joined room topics");
        Ok(())
    }

    /// Loads the initial board and local symbol.
    #[instrument(skip(self, source))]
    pub async fn bootstrap<B: BootstrapSource + ?Sized>(&self, source: &B) -> Result<(), BootstrapError> {
        let state = self.store.state();
        let session = state.session();
        let board = source.fetch_board(session.room_id()).await?;
        let symbol = source
            .fetch_symbol(session.room_id(), session.local_player())
            .await?;
        self.store
            .update(|state| apply_bootstrap(state, board, symbol));
        info!(symbol = ?symbol, "Session bootstrapped");
        Ok(())
    }

    /// Submits a local move now.
    pub fn submit(&self, coord: Coord) -> Result<Move, SubmitError> {
        self.submit_at(coord, Instant::now())
    }

    /// Submits a local move, timing it from `now`.
    pub fn submit_at(&self, coord: Coord, now: Instant) -> Result<Move, SubmitError> {
        self.controller.submit(
            &self.store,
            &self.transport,
            self.topics.move_destination(),
            coord,
            now,
        )
    }

    /// Decodes and reconciles one inbound frame.
    ///
    /// Failures are logged and returned; the store is left unchanged.
    #[instrument(skip(self, body))]
    pub fn handle_frame(&self, topic: &str, body: &str) -> Result<(), FrameError> {
        let result = self.route_frame(topic, body);
        if let Err(err) = &result {
            warn!(error = %err, "Inbound frame dropped");
        }
        result
    }

    fn route_frame(&self, topic: &str, body: &str) -> Result<(), FrameError> {
        let kind = self
            .topics
            .route(topic)
            .ok_or_else(|| FrameError::UnroutedTopic(topic.to_string()))?;
        let event = decode(kind, body)?;
        SyncReconciler::on_inbound_event(&self.store, event)?;
        Ok(())
    }

    /// Deadline of the in-flight move, if any.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.controller.deadline(&self.store.state())
    }

    /// Expires the in-flight move if overdue.
    pub fn expire(&self) -> Option<Move> {
        self.expire_at(Instant::now())
    }

    /// Expires the in-flight move if overdue at `now`.
    pub fn expire_at(&self, now: Instant) -> Option<Move> {
        self.controller.expire_pending(&self.store, now)
    }

    /// Records a connection state pushed by the transport.
    pub fn set_connection(&self, connection: ConnectionState) {
        if self.store.state().connection() != connection {
            info!(%connection, "Connection state changed");
            self.store.update(|state| state.connection = connection);
        }
    }

    /// Leaves the room: drops the in-flight move, unsubscribes and resets.
    #[instrument(skip(self))]
    pub fn leave(&self) {
        for topic in self.topics.topics() {
            if let Err(err) = self.transport.unsubscribe(topic) {
                warn!(topic, error = %err, "Unsubscribe failed");
            }
        }
        let state = self.store.state();
        let session = state.session();
        self.store
            .reset(session.room_id().clone(), session.local_player().clone());
        info!("Left room");
    }

    /// Starts over after a finished game.
    ///
    /// Moves to the rematch room when the authority created one, otherwise
    /// resets in place. Returns the room now joined.
    #[instrument(skip(self))]
    pub fn reset_for_rematch(&mut self) -> Result<RoomId, TransportError> {
        let state = self.store.state();
        let session = state.session();
        let room = session
            .rematch()
            .new_room()
            .clone()
            .unwrap_or_else(|| session.room_id().clone());

        if room != *session.room_id() {
            let next = RoomTopics::for_room(&self.config, &room);
            let next_topics = next.topics();
            for (joined, topic) in next_topics.iter().enumerate() {
                if let Err(err) = self.transport.subscribe(topic) {
                    // Stay in the finished room so the switch can be retried
                    for subscribed in &next_topics[..joined] {
                        if let Err(err) = self.transport.unsubscribe(subscribed) {
                            warn!(topic = subscribed, error = %err, "Unsubscribe failed");
                        }
                    }
                    return Err(err);
                }
            }
            for topic in self.topics.topics() {
                if let Err(err) = self.transport.unsubscribe(topic) {
                    warn!(topic, error = %err, "Unsubscribe failed");
                }
            }
            self.topics = next;
            debug!(room_id = %room, "Switched to rematch room");
        }
        self.store
            .reset(room.clone(), session.local_player().clone());
        info!(room_id = %room, "Session reset for rematch");
        Ok(room)
    }
}
