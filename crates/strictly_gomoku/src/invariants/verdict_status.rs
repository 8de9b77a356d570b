//! Verdict/status invariant: only ended games carry a verdict.

use super::super::phases::GameStatus;
use super::{GameView, Invariant};

/// Invariant: a verdict or winning line implies `Ended`.
pub struct VerdictStatusInvariant;

impl<'a> Invariant<GameView<'a>> for VerdictStatusInvariant {
    fn holds(view: &GameView<'a>) -> bool {
        let decided = view.turn.outcome().is_some() || !view.turn.winning_line().is_empty();
        !decided || view.turn.status() == GameStatus::Ended
    }

    fn description() -> &'static str {
        "Only ended games carry a verdict"
    }
}
