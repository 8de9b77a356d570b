//! Message channel seam.
//!
//! The engine only needs to send a frame to a named destination, manage
//! topic subscriptions and observe the connection state. Concrete channels
//! (STOMP over WebSocket, test doubles) implement [`Transport`].

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::session::RoomId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Connection state pushed by the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Frames can be sent.
    Connected,
}

/// Outbound half of the message channel plus its subscriptions.
pub trait Transport {
    /// Sends a frame body to a destination.
    fn send(&self, destination: &str, body: &str) -> Result<(), TransportError>;

    /// Starts delivering frames published on `topic`.
    fn subscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Stops delivering frames published on `topic`.
    fn unsubscribe(&self, topic: &str) -> Result<(), TransportError>;

    /// Observable connection state. The channel pushes every change.
    fn connection(&self) -> watch::Receiver<ConnectionState>;
}

/// Which stream an inbound frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Move echoes.
    Game,
    /// Room lifecycle events.
    Room,
}

/// Destination and topics resolved for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTopics {
    move_destination: String,
    game_topic: String,
    room_topic: String,
}

impl RoomTopics {
    /// Resolves the configured templates for `room`.
    pub fn for_room(config: &ClientConfig, room: &RoomId) -> Self {
        let fill = |template: &str| template.replace("{room}", room.as_str());
        Self {
            move_destination: fill(config.move_destination()),
            game_topic: fill(config.game_topic()),
            room_topic: fill(config.room_topic()),
        }
    }

    /// Destination for outbound moves.
    pub fn move_destination(&self) -> &str {
        &self.move_destination
    }

    /// Topic carrying move echoes.
    pub fn game_topic(&self) -> &str {
        &self.game_topic
    }

    /// Topic carrying room lifecycle events.
    pub fn room_topic(&self) -> &str {
        &self.room_topic
    }

    /// Both inbound topics.
    pub fn topics(&self) -> [&str; 2] {
        [&self.game_topic, &self.room_topic]
    }

    /// Classifies an inbound topic; `None` for topics of other rooms.
    pub fn route(&self, topic: &str) -> Option<TopicKind> {
        if topic == self.game_topic {
            Some(TopicKind::Game)
        } else if topic == self.room_topic {
            Some(TopicKind::Room)
        } else {
            None
        }
    }
}

/// A frame sent through a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    /// Destination the frame was sent to.
    pub destination: String,
    /// Frame body.
    pub body: String,
}

#[derive(Debug, Default)]
struct MemoryInner {
    sent: Vec<SentFrame>,
    subscriptions: Vec<String>,
    reject_sends: Option<String>,
}

/// In-process transport that records traffic.
///
/// Cloned handles share the same state, so a caller can keep one handle for
/// inspection while the session owns another. Used by the replay command and
/// by tests.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
    connection: Arc<watch::Sender<ConnectionState>>,
}

impl MemoryTransport {
    /// Creates a transport in the given connection state.
    pub fn new(state: ConnectionState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            inner: Arc::new(Mutex::new(MemoryInner::default())),
            connection: Arc::new(tx),
        }
    }

    /// Creates a connected transport.
    pub fn connected() -> Self {
        Self::new(ConnectionState::Connected)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes a connection state change to observers.
    #[instrument(skip(self))]
    pub fn set_connection(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    /// Makes every send fail with `reason` until cleared with `None`.
    pub fn reject_sends(&self, reason: Option<String>) {
        self.lock().reject_sends = reason;
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<SentFrame> {
        self.lock().sent.clone()
    }

    /// Topics currently subscribed.
    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    fn require_connected(&self, destination: &str) -> Result<(), TransportError> {
        if *self.connection.borrow() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(TransportError::NotConnected {
                destination: destination.to_string(),
            })
        }
    }
}

impl Transport for MemoryTransport {
    fn send(&self, destination: &str, body: &str) -> Result<(), TransportError> {
        self.require_connected(destination)?;
        let mut inner = self.lock();
        if let Some(reason) = inner.reject_sends.clone() {
            warn!(destination, %reason, "Send rejected");
            return Err(TransportError::Rejected {
                destination: destination.to_string(),
                reason,
            });
        }
        debug!(destination, body, "Frame sent");
        inner.sent.push(SentFrame {
            destination: destination.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.require_connected(topic)?;
        let mut inner = self.lock();
        if !inner.subscriptions.iter().any(|t| t == topic) {
            inner.subscriptions.push(topic.to_string());
        }
        debug!(topic, "Subscribed");
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.lock().subscriptions.retain(|t| t != topic);
        debug!(topic, "Unsubscribed");
        Ok(())
    }

    fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_resolve_room_placeholder() {
        let topics = RoomTopics::for_room(&ClientConfig::default(), &RoomId::new("42"));
        assert_eq!(topics.move_destination(), "/app/game/42/move");
        assert_eq!(topics.route("/topic/game/42"), Some(TopicKind::Game));
        assert_eq!(topics.route("/topic/room/42"), Some(TopicKind::Room));
        assert_eq!(topics.route("/topic/room/43"), None);
    }

    #[test]
    fn test_disconnected_send_fails() {
        let transport = MemoryTransport::new(ConnectionState::Disconnected);
        let err = transport.send("/app/x", "{}").expect_err("not connected");
        assert!(matches!(err, TransportError::NotConnected { .. }));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_clones_share_traffic() {
        let transport = MemoryTransport::connected();
        let observer = transport.clone();
        transport.send("/app/x", "{}").expect("connected");
        transport.subscribe("/topic/a").expect("connected");
        assert_eq!(observer.sent().len(), 1);
        assert_eq!(observer.subscriptions(), vec!["/topic/a".to_string()]);
    }

    #[test]
    fn test_connection_changes_are_pushed() {
        let transport = MemoryTransport::new(ConnectionState::Connecting);
        let rx = transport.connection();
        transport.set_connection(ConnectionState::Connected);
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow(), ConnectionState::Connected);
    }
}
