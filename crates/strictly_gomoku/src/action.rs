//! First-class action types for five-in-a-row.
//!
//! Moves are domain events, not side effects. They carry the player's intent
//! and can be validated independently of execution.

use super::{Coord, Symbol};
use serde::{Deserialize, Serialize};

/// A stone placement.
///
/// The sequence number is assigned by the authority. Locally submitted moves
/// carry the sequence the client expects the authority to assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Target intersection.
    pub coord: Coord,
    /// The player placing the stone.
    pub player: Symbol,
    /// Authority-assigned ordering.
    pub sequence: u64,
}

impl Move {
    /// Creates a new move.
    pub fn new(coord: Coord, player: Symbol, sequence: u64) -> Self {
        Self {
            coord,
            player,
            sequence,
        }
    }

    /// Returns the target coordinate.
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// Returns the player making this move.
    pub fn player(&self) -> Symbol {
        self.player
    }

    /// True if `other` places the same symbol on the same cell.
    pub fn same_placement(&self, other: &Move) -> bool {
        self.coord == other.coord && self.player == other.player
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} -> {}", self.sequence, self.player, self.coord)
    }
}

/// Error applying a move to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BoardError {
    /// Row or column outside `[0, 15)`.
    #[display("Coordinate {} is off the board", _0)]
    OutOfBounds(#[error(not(source))] Coord),

    /// The target cell already holds a stone.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(#[error(not(source))] Coord),
}
