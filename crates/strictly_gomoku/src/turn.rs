//! Turn arbitration and game lifecycle.
//!
//! ```text
//! Waiting --start--> Playing --advance--> Playing
//!                       |
//!                       +--finish / end_without_verdict--> Ended
//! ```
//!
//! Nothing leaves `Ended`; a rematch builds a fresh [`TurnState`].

use super::phases::{GameStatus, Outcome};
use super::rules::{WinningLine, check_draw, check_win};
use super::{Board, Coord, Move, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Error raised by an illegal lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TransitionError {
    /// The game has not started yet.
    #[display("Game has not started")]
    NotStarted,

    /// The game is already being played.
    #[display("Game already started")]
    AlreadyStarted,

    /// The game is over; only a reset can follow.
    #[display("Game has ended")]
    AlreadyEnded,
}

/// Whose move it is, plus the lifecycle phase and verdict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnState {
    status: GameStatus,
    current_turn: Symbol,
    outcome: Option<Outcome>,
    winning_line: Vec<Coord>,
}

impl TurnState {
    /// Creates a waiting game. `X` will move first.
    pub fn new() -> Self {
        Self {
            status: GameStatus::Waiting,
            current_turn: Symbol::X,
            outcome: None,
            winning_line: Vec::new(),
        }
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the symbol expected to move next.
    pub fn current_turn(&self) -> Symbol {
        self.current_turn
    }

    /// Returns the verdict, if the game ended with one.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Returns the winning run, empty unless a player won.
    pub fn winning_line(&self) -> &[Coord] {
        &self.winning_line
    }

    /// True if `symbol` may move now.
    pub fn is_legal_for(&self, symbol: Symbol) -> bool {
        self.status == GameStatus::Playing && self.current_turn == symbol
    }

    /// `Waiting -> Playing`. The first mover always moves first.
    #[instrument(skip(self), fields(status = %self.status))]
    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.status {
            GameStatus::Waiting => {
                self.status = GameStatus::Playing;
                self.current_turn = Symbol::X;
                info!("Game started");
                Ok(())
            }
            GameStatus::Playing => Err(TransitionError::AlreadyStarted),
            GameStatus::Ended => Err(TransitionError::AlreadyEnded),
        }
    }

    /// Hands the turn to the opponent of `mover`.
    pub fn advance(&mut self, mover: Symbol) -> Result<(), TransitionError> {
        self.set_turn(mover.opponent())
    }

    /// Sets the next mover, as declared by the authority.
    pub fn set_turn(&mut self, next: Symbol) -> Result<(), TransitionError> {
        match self.status {
            GameStatus::Playing => {
                self.current_turn = next;
                Ok(())
            }
            GameStatus::Waiting => Err(TransitionError::NotStarted),
            GameStatus::Ended => Err(TransitionError::AlreadyEnded),
        }
    }

    /// Enters `Ended` with a verdict.
    ///
    /// Re-asserting while already ended replaces the verdict, since later
    /// verdicts come from the authority.
    #[instrument(skip(self, line), fields(status = %self.status))]
    pub fn finish(
        &mut self,
        outcome: Outcome,
        line: Option<WinningLine>,
    ) -> Result<(), TransitionError> {
        if self.status == GameStatus::Waiting {
            return Err(TransitionError::NotStarted);
        }
        if self.status == GameStatus::Ended && self.outcome != Some(outcome) {
            warn!(previous = ?self.outcome, %outcome, "Replacing verdict of ended game");
        }
        self.status = GameStatus::Ended;
        self.outcome = Some(outcome);
        self.winning_line = line.map(WinningLine::into_cells).unwrap_or_default();
        info!(%outcome, "Game ended");
        Ok(())
    }

    /// Enters `Ended` without naming a winner.
    ///
    /// An existing verdict is kept when already ended.
    pub fn end_without_verdict(&mut self) -> Result<(), TransitionError> {
        match self.status {
            GameStatus::Waiting => Err(TransitionError::NotStarted),
            GameStatus::Playing => {
                self.status = GameStatus::Ended;
                info!("Game ended without verdict");
                Ok(())
            }
            GameStatus::Ended => Ok(()),
        }
    }

    /// Resolves the position after `mv` has been applied to `board`.
    ///
    /// Win is checked first, then draw; otherwise the turn alternates.
    /// Returns the verdict if the move ended the game.
    #[instrument(skip(self, board), fields(mv = %mv))]
    pub fn resolve_move(&mut self, board: &Board, mv: &Move) -> Result<Option<Outcome>, TransitionError> {
        if let Some(line) = check_win(board, mv.coord, mv.player) {
            let outcome = Outcome::Winner(mv.player);
            self.finish(outcome, Some(line))?;
            return Ok(Some(outcome));
        }
        if check_draw(board) {
            self.finish(Outcome::Draw, None)?;
            return Ok(Some(Outcome::Draw));
        }
        if self.status == GameStatus::Ended {
            debug!("Move recorded on ended game");
            return Ok(None);
        }
        self.advance(mv.player)?;
        Ok(None)
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}
