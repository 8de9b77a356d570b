//! Strictly Gomoku - pure five-in-a-row rules.
//!
//! Board values, incremental win detection, turn arbitration and placement
//! contracts. Nothing in this crate performs I/O; the client crate builds its
//! optimistic session engine on top of it.
//!
//! # Example
//!
//! ```
//! use strictly_gomoku::{Board, Coord, Move, Symbol, TurnState};
//!
//! let mut turn = TurnState::new();
//! turn.start().unwrap();
//!
//! let mv = Move::new(Coord::new(7, 7), Symbol::X, 1);
//! let board = Board::new().apply(&mv).unwrap();
//! turn.resolve_move(&board, &mv).unwrap();
//!
//! assert_eq!(turn.current_turn(), Symbol::O);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod contracts;
pub mod invariants;
mod phases;
pub mod rules;
mod turn;
mod types;

pub use action::{BoardError, Move};
pub use contracts::{
    CellIsEmpty, GameActive, LegalPlacement, PlacementError, PlayersTurn, WithinBounds,
};
pub use invariants::{GameView, GomokuInvariants, Invariant, InvariantSet, InvariantViolation};
pub use phases::{GameStatus, Outcome};
pub use rules::{Direction, WinningLine, check_draw, check_win};
pub use turn::{TransitionError, TurnState};
pub use types::{BOARD_SIZE, Board, Cell, Coord, Symbol, WIN_LENGTH};
