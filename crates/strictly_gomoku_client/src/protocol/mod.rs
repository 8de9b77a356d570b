//! Wire schema.
//!
//! Every inbound frame is normalized here into one canonical
//! [`InboundEvent`] before it reaches the reconciler. Frames that fail
//! normalization surface as [`ProtocolError`] and never touch the store.

mod cells;
mod echo;
mod room;

pub use cells::{WireCell, board_from_wire, board_to_wire};
pub use echo::{MoveEcho, WireGameResult, WireGameState, decode_move_echo};
pub use room::{PlayerAssignment, RoomEvent, decode_room_event};

use crate::error::ProtocolError;
use crate::transport::TopicKind;
use serde::Serialize;
use strictly_gomoku::Coord;

/// Outbound move frame. `xPosition` is the row, `yPosition` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMove {
    /// Row index.
    pub x_position: usize,
    /// Column index.
    pub y_position: usize,
}

impl From<Coord> for OutboundMove {
    fn from(coord: Coord) -> Self {
        Self {
            x_position: coord.row,
            y_position: coord.col,
        }
    }
}

impl OutboundMove {
    /// Serializes the frame body.
    pub fn to_body(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Canonical inbound event.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum InboundEvent {
    /// Move echo from the game topic.
    Move(MoveEcho),
    /// Lifecycle event from the room topic.
    Room(RoomEvent),
}

/// Decodes a frame body according to the topic it arrived on.
pub fn decode(kind: TopicKind, body: &str) -> Result<InboundEvent, ProtocolError> {
    match kind {
        TopicKind::Game => decode_move_echo(body).map(InboundEvent::from),
        TopicKind::Room => decode_room_event(body).map(InboundEvent::from),
    }
}
