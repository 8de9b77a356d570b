//! Room lifecycle events.

use super::cells::symbol_from_wire;
use super::echo::WireGameResult;
use crate::error::ProtocolError;
use crate::session::{PlayerId, RoomId};
use serde::Deserialize;
use strictly_gomoku::Symbol;
use tracing::{debug, instrument};

/// A player and the symbol the authority assigned them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAssignment {
    /// The player.
    pub player_id: PlayerId,
    /// Assigned symbol.
    #[serde(deserialize_with = "symbol_from_wire")]
    pub symbol: Symbol,
    /// Display name, when sent.
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Event published on the room topic, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, strum::IntoStaticStr)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomEvent {
    /// A player entered the room.
    PlayerJoined {
        /// Joining player.
        player_id: PlayerId,
        /// Display name, when sent.
        #[serde(default)]
        player_name: Option<String>,
    },

    /// A player left the room.
    PlayerLeft {
        /// Leaving player.
        player_id: PlayerId,
    },

    /// A player signalled readiness.
    PlayerReady {
        /// Ready player.
        player_id: PlayerId,
    },

    /// The game began; carries the symbol assignment.
    GameStarted {
        /// Seated players and their symbols.
        players: Vec<PlayerAssignment>,
    },

    /// The authority ended the game.
    GameEnded {
        /// Final result.
        game_result: WireGameResult,
        /// Winner, absent for draws.
        #[serde(default)]
        winner_id: Option<PlayerId>,
    },

    /// A player asked for a rematch.
    RematchRequested {
        /// Requesting player.
        player_id: PlayerId,
    },

    /// The rematch request was accepted.
    RematchAccepted {
        /// Accepting player, when sent.
        #[serde(default)]
        player_id: Option<PlayerId>,
    },

    /// The authority opened a room for the rematch.
    RematchCreated {
        /// Room hosting the rematch.
        new_room_id: RoomId,
    },

    /// Free-form room status update.
    RoomStatusChanged {
        /// New status.
        status: String,
    },
}

impl RoomEvent {
    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Normalizes a room event body. Unknown `type` values are rejected.
#[instrument(skip(body))]
pub fn decode_room_event(body: &str) -> Result<RoomEvent, ProtocolError> {
    let event: RoomEvent = serde_json::from_str(body)?;
    debug!(kind = event.kind(), "Decoded room event");
    Ok(event)
}
