//! Contract-based placement validation.
//!
//! Each precondition is a small check over the board and turn state.
//! [`LegalPlacement`] composes them in a fixed priority order so callers
//! always see the most fundamental reason a placement is illegal.

use super::phases::GameStatus;
use super::turn::TurnState;
use super::{Board, Coord, Symbol};
use tracing::instrument;

/// Why a placement is not legal right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlacementError {
    /// Status is not `Playing`.
    #[display("game not active")]
    GameNotActive,

    /// The player's symbol does not hold the turn (or is unknown).
    #[display("not your turn")]
    NotYourTurn,

    /// Coordinate outside the board.
    #[display("coordinate {} is off the board", _0)]
    OutOfBounds(#[error(not(source))] Coord),

    /// Target cell already holds a stone.
    #[display("cell {} is already occupied", _0)]
    CellOccupied(#[error(not(source))] Coord),
}

/// Precondition: the game is being played.
pub struct GameActive;

impl GameActive {
    /// Checks the precondition.
    pub fn check(turn: &TurnState) -> Result<(), PlacementError> {
        if turn.status() == GameStatus::Playing {
            Ok(())
        } else {
            Err(PlacementError::GameNotActive)
        }
    }
}

/// Precondition: the player holds the turn.
pub struct PlayersTurn;

impl PlayersTurn {
    /// Checks the precondition. An unassigned symbol never holds the turn.
    pub fn check(turn: &TurnState, player: Option<Symbol>) -> Result<(), PlacementError> {
        match player {
            Some(symbol) if turn.current_turn() == symbol => Ok(()),
            _ => Err(PlacementError::NotYourTurn),
        }
    }
}

/// Precondition: the coordinate is on the board.
pub struct WithinBounds;

impl WithinBounds {
    /// Checks the precondition.
    pub fn check(coord: Coord) -> Result<(), PlacementError> {
        if coord.in_bounds() {
            Ok(())
        } else {
            Err(PlacementError::OutOfBounds(coord))
        }
    }
}

/// Precondition: the target cell is empty.
pub struct CellIsEmpty;

impl CellIsEmpty {
    /// Checks the precondition.
    pub fn check(board: &Board, coord: Coord) -> Result<(), PlacementError> {
        if board.is_vacant(coord) {
            Ok(())
        } else {
            Err(PlacementError::CellOccupied(coord))
        }
    }
}

/// Composite precondition, checked in priority order:
/// active game, turn, bounds, vacancy.
pub struct LegalPlacement;

impl LegalPlacement {
    /// Validates all placement preconditions.
    #[instrument(skip(board, turn))]
    pub fn check(
        board: &Board,
        turn: &TurnState,
        player: Option<Symbol>,
        coord: Coord,
    ) -> Result<(), PlacementError> {
        GameActive::check(turn)?;
        PlayersTurn::check(turn, player)?;
        WithinBounds::check(coord)?;
        CellIsEmpty::check(board, coord)?;
        Ok(())
    }
}
