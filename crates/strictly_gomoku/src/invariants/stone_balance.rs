//! Stone balance invariant: X moves first and players alternate.

use super::super::Symbol;
use super::{GameView, Invariant};

/// Invariant: X has as many stones as O, or exactly one more.
pub struct StoneBalanceInvariant;

impl<'a> Invariant<GameView<'a>> for StoneBalanceInvariant {
    fn holds(view: &GameView<'a>) -> bool {
        let x = view.board.count(Symbol::X);
        let o = view.board.count(Symbol::O);
        x == o || x == o + 1
    }

    fn description() -> &'static str {
        "X has as many stones as O, or one more"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Coord, Move, TurnState};

    #[test]
    fn test_one_extra_x_holds() {
        let board = Board::new()
            .apply(&Move::new(Coord::new(0, 0), Symbol::X, 1))
            .expect("legal");
        let turn = TurnState::new();
        assert!(StoneBalanceInvariant::holds(&GameView::new(&board, &turn)));
    }

    #[test]
    fn test_o_first_violates() {
        let board = Board::new()
            .apply(&Move::new(Coord::new(0, 0), Symbol::O, 1))
            .expect("legal");
        let turn = TurnState::new();
        assert!(!StoneBalanceInvariant::holds(&GameView::new(&board, &turn)));
    }
}
