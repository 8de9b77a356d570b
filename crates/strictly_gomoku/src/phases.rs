//! Lifecycle phases and outcomes.

use super::Symbol;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, derive_more::Display,
)]
pub enum GameStatus {
    /// Players are gathering; no moves are legal.
    #[default]
    Waiting,
    /// Moves are being played.
    Playing,
    /// Terminal. Only a full reset leaves this phase.
    Ended,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Player won the game.
    Winner(Symbol),
    /// Board filled without a winning run.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Winner(symbol) => Some(*symbol),
            Outcome::Draw => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(symbol) => write!(f, "Player {} wins", symbol),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}
