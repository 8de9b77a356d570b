//! Core domain types for five-in-a-row.

use super::action::{BoardError, Move};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Board edge length.
pub const BOARD_SIZE: usize = 15;

/// Contiguous stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// Player symbol.
///
/// `X` is always the first mover (player A), `O` the second (player B).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
pub enum Symbol {
    /// First mover.
    X,
    /// Second mover.
    O,
}

impl Symbol {
    /// Returns the opposing symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    /// Parses the wire representation (`"X"` or `"O"`).
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim() {
            "X" | "x" => Some(Symbol::X),
            "O" | "o" => Some(Symbol::O),
            _ => None,
        }
    }
}

/// A single intersection on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Cell {
    /// No stone.
    #[default]
    Empty,
    /// Stone placed by a player.
    Occupied(Symbol),
}

impl Cell {
    /// Returns the symbol occupying this cell, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(symbol) => Some(symbol),
        }
    }

    /// True if no stone is placed here.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Board coordinate, row-major.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate. Bounds are checked by the board, not here.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True if the coordinate lies on a 15x15 board.
    pub fn in_bounds(self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Steps by a signed offset, returning `None` when leaving the board.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        let next = Self::new(row, col);
        next.in_bounds().then_some(next)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 15x15 board.
///
/// Boards are values: [`Board::apply`] returns a new board and never mutates
/// its input, so a speculative board can be compared structurally with an
/// authoritative one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from row-major cells.
    pub fn from_rows(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Returns the rows of the board.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Gets the cell at a coordinate, or `None` when out of bounds.
    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.cells.get(coord.row)?.get(coord.col).copied()
    }

    /// True if the coordinate is on the board and empty.
    pub fn is_vacant(&self, coord: Coord) -> bool {
        matches!(self.cell(coord), Some(Cell::Empty))
    }

    /// Applies a move, returning a new board with exactly that cell set.
    #[instrument(skip(self), fields(mv = %mv))]
    pub fn apply(&self, mv: &Move) -> Result<Board, BoardError> {
        match self.cell(mv.coord) {
            None => Err(BoardError::OutOfBounds(mv.coord)),
            Some(Cell::Occupied(_)) => Err(BoardError::CellOccupied(mv.coord)),
            Some(Cell::Empty) => {
                let mut next = self.clone();
                next.cells[mv.coord.row][mv.coord.col] = Cell::Occupied(mv.player);
                Ok(next)
            }
        }
    }

    /// Returns a new board with the cell forced to `cell`.
    ///
    /// Only bounds are checked. This exists for authoritative corrections,
    /// where the server's view replaces whatever the client holds.
    pub fn with_cell(&self, coord: Coord, cell: Cell) -> Result<Board, BoardError> {
        if !coord.in_bounds() {
            return Err(BoardError::OutOfBounds(coord));
        }
        let mut next = self.clone();
        next.cells[coord.row][coord.col] = cell;
        Ok(next)
    }

    /// True iff no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|c| !c.is_empty())
    }

    /// True iff no stone has been placed.
    pub fn is_clear(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_empty())
    }

    /// Number of stones placed by `symbol`.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| **c == Cell::Occupied(symbol))
            .count()
    }

    /// Iterates over every placed stone.
    pub fn stones(&self) -> impl Iterator<Item = (Coord, Symbol)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.symbol().map(|s| (Coord::new(row, col), s)))
        })
    }

    /// Formats the board as text, `.` for empty cells.
    pub fn display(&self) -> String {
        let mut result = String::with_capacity(BOARD_SIZE * (BOARD_SIZE * 2 + 1));
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                result.push(match cell {
                    Cell::Empty => '.',
                    Cell::Occupied(Symbol::X) => 'X',
                    Cell::Occupied(Symbol::O) => 'O',
                });
                if col + 1 < BOARD_SIZE {
                    result.push(' ');
                }
            }
            if row + 1 < BOARD_SIZE {
                result.push('\n');
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_sets_exactly_one_cell() {
        let board = Board::new();
        let mv = Move::new(Coord::new(3, 4), Symbol::X, 1);
        let next = board.apply(&mv).expect("empty cell");

        assert_eq!(next.cell(Coord::new(3, 4)), Some(Cell::Occupied(Symbol::X)));
        assert_eq!(next.stones().count(), 1);
        // Input untouched
        assert!(board.is_clear());
    }

    #[test]
    fn test_apply_every_cell() {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let coord = Coord::new(row, col);
                let next = Board::new()
                    .apply(&Move::new(coord, Symbol::O, 1))
                    .expect("in bounds");
                assert_eq!(next.cell(coord), Some(Cell::Occupied(Symbol::O)));
            }
        }
    }

    #[test]
    fn test_apply_occupied_fails() {
        let coord = Coord::new(7, 7);
        let board = Board::new()
            .apply(&Move::new(coord, Symbol::X, 1))
            .expect("empty");
        let result = board.apply(&Move::new(coord, Symbol::O, 2));
        assert_eq!(result, Err(BoardError::CellOccupied(coord)));
    }

    #[test]
    fn test_apply_out_of_bounds_fails() {
        for coord in [Coord::new(15, 0), Coord::new(0, 15), Coord::new(99, 99)] {
            let result = Board::new().apply(&Move::new(coord, Symbol::X, 1));
            assert_eq!(result, Err(BoardError::OutOfBounds(coord)));
        }
    }

    #[test]
    fn test_offset_stops_at_edges() {
        assert_eq!(Coord::new(0, 0).offset(-1, 0), None);
        assert_eq!(Coord::new(14, 14).offset(0, 1), None);
        assert_eq!(Coord::new(5, 5).offset(1, -1), Some(Coord::new(6, 4)));
    }

    #[test]
    fn test_full_board() {
        let board = Board::from_rows([[Cell::Occupied(Symbol::X); BOARD_SIZE]; BOARD_SIZE]);
        assert!(board.is_full());
        assert!(!Board::new().is_full());
    }

    #[test]
    fn test_display_marks_stones() {
        let board = Board::new()
            .apply(&Move::new(Coord::new(0, 0), Symbol::X, 1))
            .and_then(|b| b.apply(&Move::new(Coord::new(0, 1), Symbol::O, 2)))
            .expect("legal");
        let first_line = board.display().lines().next().map(str::to_string);
        assert_eq!(first_line.as_deref(), Some("X O . . . . . . . . . . . . ."));
    }
}
