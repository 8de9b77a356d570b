//! Strictly Gomoku client - optimistic session engine
//!
//! Keeps an eventually consistent view of one five-in-a-row game while the
//! authority stays the source of truth.
//!
//! # Architecture
//!
//! - **Store**: one [`SessionState`] value with synchronous notifications
//! - **Validator**: local gate in front of every move
//! - **Controller**: optimistic apply, send, and ack timeout
//! - **Reconciler**: inbound echoes and room events, authority wins
//! - **Protocol**: normalization of inbound JSON into [`InboundEvent`]
//! - **Driver**: async loop multiplexing frames, commands and timers
//!
//! # Example
//!
//! ```
//! use strictly_gomoku_client::{ClientConfig, GameClient, MemoryTransport, PlayerId, RoomId};
//!
//! let transport = MemoryTransport::connected();
//! let client = GameClient::new(
//!     ClientConfig::default(),
//!     transport,
//!     RoomId::new("42"),
//!     PlayerId::new("alice"),
//! );
//! client.join().unwrap();
//! client
//!     .handle_frame(
//!         "/topic/room/42",
//!         r#"{"type": "GAME_STARTED", "players": [
//!             {"playerId": "alice", "symbol": "X"},
//!             {"playerId": "bob", "symbol": "O"}]}"#,
//!     )
//!     .unwrap();
//! assert!(client.state().session().is_local_turn());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;
mod client;
mod config;
mod controller;
mod driver;
mod error;
pub mod protocol;
mod reconciler;
mod replay;
mod session;
mod store;
mod transport;
mod validator;

// Crate-level exports - Session facade
pub use client::GameClient;
pub use driver::{Command, DriverClosed, DriverHandle, InboundFrame, SessionDriver};

// Crate-level exports - State
pub use session::{GameSession, PendingMove, PlayerId, RematchState, RoomId, Seat, SessionState};
pub use store::{Listener, SessionStore, SubscriptionId};

// Crate-level exports - Move pipeline
pub use controller::OptimisticMoveController;
pub use reconciler::SyncReconciler;
pub use validator::{MoveRejection, MoveValidator};

// Crate-level exports - Protocol
pub use protocol::{InboundEvent, MoveEcho, OutboundMove, RoomEvent};

// Crate-level exports - Seams
pub use bootstrap::{BootstrapSource, HttpBootstrap};
pub use transport::{ConnectionState, MemoryTransport, RoomTopics, SentFrame, TopicKind, Transport};

// Crate-level exports - Configuration and errors
pub use config::{ClientConfig, ConfigError, TimeoutPolicy};
pub use error::{
    BootstrapError, FrameError, ProtocolError, ReconcileError, SubmitError, TransportError,
};

// Crate-level exports - Replay
pub use replay::{ReplayReport, TranscriptEntry, replay};
