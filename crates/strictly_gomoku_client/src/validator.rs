//! Local move validation.

use crate::session::SessionState;
use strictly_gomoku::{BoardError, Coord, LegalPlacement, PlacementError};
use tracing::{debug, instrument};

/// Why a candidate move was refused before leaving the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveRejection {
    /// A previous move is still awaiting its echo.
    #[display("move in flight")]
    MoveInFlight,

    /// Status is not `Playing`.
    #[display("game not active")]
    GameNotActive,

    /// The local player does not hold the turn.
    #[display("not your turn")]
    NotYourTurn,

    /// Coordinate outside the board.
    #[display("coordinate {} is off the board", _0)]
    OutOfBounds(#[error(not(source))] Coord),

    /// Target cell already holds a stone.
    #[display("cell {} is already occupied", _0)]
    CellOccupied(#[error(not(source))] Coord),
}

impl From<PlacementError> for MoveRejection {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::GameNotActive => MoveRejection::GameNotActive,
            PlacementError::NotYourTurn => MoveRejection::NotYourTurn,
            PlacementError::OutOfBounds(coord) => MoveRejection::OutOfBounds(coord),
            PlacementError::CellOccupied(coord) => MoveRejection::CellOccupied(coord),
        }
    }
}

impl From<BoardError> for MoveRejection {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::OutOfBounds(coord) => MoveRejection::OutOfBounds(coord),
            BoardError::CellOccupied(coord) => MoveRejection::CellOccupied(coord),
        }
    }
}

/// Gate in front of the optimistic controller. Pure and synchronous.
pub struct MoveValidator;

impl MoveValidator {
    /// Checks a candidate placement for the local player.
    ///
    /// The in-flight lock is checked before every board or turn condition.
    #[instrument(skip(state), fields(pending = state.pending().is_some()))]
    pub fn validate(state: &SessionState, candidate: Coord) -> Result<(), MoveRejection> {
        if state.pending().is_some() {
            debug!("Rejecting move while another is in flight");
            return Err(MoveRejection::MoveInFlight);
        }
        let session = state.session();
        LegalPlacement::check(state.board(), session.turn(), session.local_symbol(), candidate)?;
        Ok(())
    }
}
