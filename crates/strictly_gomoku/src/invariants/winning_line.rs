//! Winning line invariant: the recorded run belongs to the winner.

use super::super::{Cell, WIN_LENGTH};
use super::{GameView, Invariant};

/// Invariant: a non-empty winning line has at least five cells, all held by
/// the declared winner.
pub struct WinningLineInvariant;

impl<'a> Invariant<GameView<'a>> for WinningLineInvariant {
    fn holds(view: &GameView<'a>) -> bool {
        let line = view.turn.winning_line();
        if line.is_empty() {
            return true;
        }
        let Some(winner) = view.turn.outcome().and_then(|o| o.winner()) else {
            return false;
        };
        line.len() >= WIN_LENGTH
            && line
                .iter()
                .all(|coord| view.board.cell(*coord) == Some(Cell::Occupied(winner)))
    }

    fn description() -> &'static str {
        "Winning line is held by the winner"
    }
}
