//! Error types for the session engine.

use crate::session::PlayerId;
use crate::validator::MoveRejection;
use derive_more::{Display, Error, From};
use strictly_gomoku::{BoardError, TransitionError};
use tracing::instrument;

/// Inbound frame failed schema normalization.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Protocol error: {} at {}:{}", message, file, line)]
pub struct ProtocolError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// Creates a new protocol error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Malformed JSON: {}", err))
    }
}

/// The outbound channel refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TransportError {
    /// The channel is not connected.
    #[display("Channel not connected (destination {})", destination)]
    NotConnected {
        /// Destination or topic of the failed operation.
        destination: String,
    },

    /// The channel rejected the frame.
    #[display("Send to {} rejected: {}", destination, reason)]
    Rejected {
        /// Destination or topic of the failed operation.
        destination: String,
        /// Reason given by the channel.
        reason: String,
    },
}

/// Failure of [`GameClient::submit`](crate::GameClient::submit).
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum SubmitError {
    /// Rejected locally; nothing was sent and nothing changed.
    #[display("Move rejected: {}", _0)]
    Rejected(MoveRejection),

    /// Sending failed; the optimistic change was undone and the move may be retried.
    #[display("Move not sent: {}", _0)]
    Transport(TransportError),

    /// The outbound frame could not be encoded; nothing changed.
    #[display("Move not encoded: {}", _0)]
    Encode(ProtocolError),
}

/// An inbound event could not be reconciled; the store is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ReconcileError {
    /// The move could not be placed on the board.
    #[display("Board rejected move: {}", _0)]
    Board(BoardError),

    /// The event implies an illegal lifecycle transition.
    #[display("Illegal transition: {}", _0)]
    Transition(TransitionError),

    /// The event names a player not seated in this room.
    #[display("Unknown player {}", _0)]
    #[from(skip)]
    UnknownPlayer(#[error(not(source))] PlayerId),

    /// A game start did not seat exactly one `X` and one `O` player.
    #[display("Invalid seat assignment: {}", _0)]
    #[from(skip)]
    InvalidSeating(#[error(not(source))] String),

    /// The event is older than state already applied.
    #[display("Stale sequence {} (last applied {})", received, last)]
    #[from(skip)]
    StaleSequence {
        /// Sequence carried by the event.
        received: u64,
        /// Last applied sequence.
        last: u64,
    },
}

/// An inbound frame was dropped without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum FrameError {
    /// The body failed normalization.
    #[display("{}", _0)]
    Protocol(ProtocolError),

    /// The event could not be reconciled.
    #[display("{}", _0)]
    Reconcile(ReconcileError),

    /// The topic belongs to no subscription of this session.
    #[display("Frame on unrouted topic {}", _0)]
    #[from(skip)]
    UnroutedTopic(#[error(not(source))] String),
}

/// Bootstrap read failed.
#[derive(Debug, Clone, Display, Error)]
#[display("Bootstrap error: {} at {}:{}", message, file, line)]
pub struct BootstrapError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl BootstrapError {
    /// Creates a new bootstrap error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<reqwest::Error> for BootstrapError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("HTTP error: {}", err))
    }
}

impl From<ProtocolError> for BootstrapError {
    #[track_caller]
    fn from(err: ProtocolError) -> Self {
        Self::new(err.message)
    }
}
