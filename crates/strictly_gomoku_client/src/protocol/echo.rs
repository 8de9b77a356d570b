//! Inbound move echo.

use super::cells::{WireCell, board_from_wire, symbol_from_wire};
use crate::error::ProtocolError;
use crate::session::PlayerId;
use serde::Deserialize;
use strictly_gomoku::{BOARD_SIZE, Board, Coord, Symbol};
use tracing::{debug, instrument};

/// Lifecycle of the game as reported in an echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireGameState {
    /// Moves are still being played.
    Ongoing,
    /// The game is over.
    Ended,
    /// Alias of `Ended` used by some senders.
    Finished,
}

/// Result of the game as reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireGameResult {
    /// No result yet.
    Ongoing,
    /// A player completed five in a row.
    Win,
    /// Board filled.
    Draw,
    /// A player gave up.
    Surrender,
}

/// Raw echo as it arrives; casing of the coordinates varies by sender.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMoveEcho {
    #[serde(alias = "xPosition")]
    xposition: i64,
    #[serde(alias = "yPosition")]
    yposition: i64,
    #[serde(deserialize_with = "symbol_from_wire")]
    player_symbol: Symbol,
    player_id: PlayerId,
    #[serde(default)]
    next_turn_player_id: Option<PlayerId>,
    #[serde(default)]
    board: Option<Vec<Vec<WireCell>>>,
    #[serde(default)]
    sequence: Option<u64>,
    #[serde(default)]
    game_state: Option<WireGameState>,
    #[serde(default)]
    game_result: Option<WireGameResult>,
}

/// Canonical move echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEcho {
    /// Where the stone was placed.
    pub coord: Coord,
    /// Who placed it.
    pub symbol: Symbol,
    /// Id of the mover.
    pub player_id: PlayerId,
    /// Id of the next mover, when declared.
    pub next_turn_player_id: Option<PlayerId>,
    /// Full authoritative board, when attached.
    pub board: Option<Board>,
    /// Authority sequence, when attached.
    pub sequence: Option<u64>,
    /// Reported lifecycle.
    pub game_state: WireGameState,
    /// Reported result.
    pub game_result: WireGameResult,
}

impl MoveEcho {
    /// True if the authority reports the game as over.
    pub fn reports_ended(&self) -> bool {
        matches!(self.game_state, WireGameState::Ended | WireGameState::Finished)
            || !matches!(self.game_result, WireGameResult::Ongoing)
    }
}

fn coordinate(name: &str, value: i64) -> Result<usize, ProtocolError> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v < BOARD_SIZE)
        .ok_or_else(|| ProtocolError::new(format!("{} {} outside [0, {})", name, value, BOARD_SIZE)))
}

impl TryFrom<RawMoveEcho> for MoveEcho {
    type Error = ProtocolError;

    fn try_from(raw: RawMoveEcho) -> Result<Self, Self::Error> {
        let coord = Coord::new(
            coordinate("xposition", raw.xposition)?,
            coordinate("yposition", raw.yposition)?,
        );
        let board = raw.board.map(board_from_wire).transpose()?;
        Ok(Self {
            coord,
            symbol: raw.player_symbol,
            player_id: raw.player_id,
            next_turn_player_id: raw.next_turn_player_id,
            board,
            sequence: raw.sequence,
            game_state: raw.game_state.unwrap_or(WireGameState::Ongoing),
            game_result: raw.game_result.unwrap_or(WireGameResult::Ongoing),
        })
    }
}

/// Normalizes a move echo body.
#[instrument(skip(body))]
pub fn decode_move_echo(body: &str) -> Result<MoveEcho, ProtocolError> {
    let raw: RawMoveEcho = serde_json::from_str(body)?;
    let echo = MoveEcho::try_from(raw)?;
    debug!(coord = %echo.coord, symbol = %echo.symbol, "Decoded move echo");
    Ok(echo)
}
