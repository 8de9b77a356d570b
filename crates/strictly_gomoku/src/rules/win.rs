//! Win detection for five-in-a-row.
//!
//! Detection is incremental: it only looks at lines through the most recently
//! placed stone, so it must run after every applied move.

use super::super::{Board, Cell, Coord, Symbol, WIN_LENGTH};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// The four line axes through a stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Direction {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
    /// Top-left to bottom-right.
    DiagonalDown,
    /// Bottom-left to top-right.
    DiagonalUp,
}

impl Direction {
    /// Forward step `(d_row, d_col)` for this axis.
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::DiagonalDown => (1, 1),
            Direction::DiagonalUp => (1, -1),
        }
    }
}

/// Coordinates of a contiguous same-symbol run of length `>= 5`.
///
/// Ordered from the backward end of the run to the forward end along its
/// [`Direction`]. The whole run is kept: an overline of six stones yields six
/// coordinates, not a five-stone window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinningLine {
    cells: Vec<Coord>,
}

impl WinningLine {
    /// Returns the coordinates of the run.
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    /// Number of stones in the run.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a detected line; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the line, returning its coordinates.
    pub fn into_cells(self) -> Vec<Coord> {
        self.cells
    }
}

/// Walks from `origin` (exclusive) while cells hold `player`.
fn scan(board: &Board, origin: Coord, (d_row, d_col): (isize, isize), player: Symbol) -> Vec<Coord> {
    let mut run = Vec::new();
    let mut cursor = origin;
    while let Some(next) = cursor.offset(d_row, d_col) {
        if board.cell(next) != Some(Cell::Occupied(player)) {
            break;
        }
        run.push(next);
        cursor = next;
    }
    run
}

/// Checks whether the stone at `coord` completes a run for `player`.
///
/// Forward and backward scans are separate walks, each bounded by the board
/// edge. Axes are tried in [`Direction`] order and the first qualifying run is
/// returned.
#[instrument(skip(board))]
pub fn check_win(board: &Board, coord: Coord, player: Symbol) -> Option<WinningLine> {
    if board.cell(coord) != Some(Cell::Occupied(player)) {
        debug!("Origin does not hold the player's stone");
        return None;
    }

    for direction in Direction::iter() {
        let (d_row, d_col) = direction.step();
        let forward = scan(board, coord, (d_row, d_col), player);
        let backward = scan(board, coord, (-d_row, -d_col), player);

        if forward.len() + backward.len() + 1 >= WIN_LENGTH {
            let mut cells: Vec<Coord> = backward.into_iter().rev().collect();
            cells.push(coord);
            cells.extend(forward);
            debug!(?direction, length = cells.len(), "Winning run found");
            return Some(WinningLine { cells });
        }
    }

    None
}
