//! Draw detection for five-in-a-row.

use super::super::{Board, Coord, Symbol};
use super::win::check_win;
use tracing::instrument;

/// A full board is a draw.
///
/// Only meaningful once [`check_win`] has returned `None` for the last move:
/// a full board whose final stone completes a run is a win.
#[instrument(skip(board))]
pub fn check_draw(board: &Board) -> bool {
    board.is_full()
}

/// Win-first draw check for the stone just placed at `coord`.
pub fn is_draw_after(board: &Board, coord: Coord, player: Symbol) -> bool {
    check_win(board, coord, player).is_none() && check_draw(board)
}
