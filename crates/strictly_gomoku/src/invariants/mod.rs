//! First-class invariants for five-in-a-row.
//!
//! Invariants are logical properties of a board together with its turn
//! state. They are testable independently and checked by the client after
//! every committed state change.

use super::Board;
use super::turn::TurnState;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of [`Invariant`]s.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

fn collect<S, I: Invariant<S>>(state: &S, violations: &mut Vec<InvariantViolation>) {
    if !I::holds(state) {
        violations.push(InvariantViolation::new(I::description()));
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        collect::<S, I1>(state, &mut violations);
        collect::<S, I2>(state, &mut violations);
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        collect::<S, I1>(state, &mut violations);
        collect::<S, I2>(state, &mut violations);
        collect::<S, I3>(state, &mut violations);
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

/// Borrowed view of a board and its turn state.
#[derive(Debug, Clone, Copy)]
pub struct GameView<'a> {
    /// The board.
    pub board: &'a Board,
    /// Lifecycle and turn.
    pub turn: &'a TurnState,
}

impl<'a> GameView<'a> {
    /// Creates a view.
    pub fn new(board: &'a Board, turn: &'a TurnState) -> Self {
        Self { board, turn }
    }
}

pub mod stone_balance;
pub mod verdict_status;
pub mod winning_line;

pub use stone_balance::StoneBalanceInvariant;
pub use verdict_status::VerdictStatusInvariant;
pub use winning_line::WinningLineInvariant;

/// All five-in-a-row invariants as a composable set.
pub type GomokuInvariants = (
    StoneBalanceInvariant,
    VerdictStatusInvariant,
    WinningLineInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Coord, Move, Symbol};

    #[test]
    fn test_invariant_set_holds_for_empty_game() {
        let board = Board::new();
        let turn = TurnState::new();
        assert!(GomokuInvariants::check_all(&GameView::new(&board, &turn)).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_moves() {
        let mut turn = TurnState::new();
        turn.start().expect("starts");
        let mut board = Board::new();
        for (i, (row, col)) in [(7, 7), (7, 8), (8, 8)].into_iter().enumerate() {
            let player = if i % 2 == 0 { Symbol::X } else { Symbol::O };
            let mv = Move::new(Coord::new(row, col), player, i as u64 + 1);
            board = board.apply(&mv).expect("legal");
            turn.resolve_move(&board, &mv).expect("playing");
        }
        assert!(GomokuInvariants::check_all(&GameView::new(&board, &turn)).is_ok());
    }

    #[test]
    fn test_invariant_set_collects_every_violation() {
        // Three O stones and no X: balance broken
        let mut board = Board::new();
        for col in 0..3 {
            board = board
                .with_cell(Coord::new(0, col), Cell::Occupied(Symbol::O))
                .expect("in bounds");
        }
        let turn = TurnState::new();
        let violations = GomokuInvariants::check_all(&GameView::new(&board, &turn))
            .expect_err("balance violated");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].description, StoneBalanceInvariant::description());
    }

    #[test]
    fn test_two_invariants_as_set() {
        let board = Board::new();
        let turn = TurnState::new();
        type TwoInvariants = (StoneBalanceInvariant, VerdictStatusInvariant);
        assert!(TwoInvariants::check_all(&GameView::new(&board, &turn)).is_ok());
    }
}
