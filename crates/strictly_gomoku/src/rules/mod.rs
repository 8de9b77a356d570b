//! Game rules for five-in-a-row.
//!
//! Pure functions evaluating a board. Rules are separated from board storage
//! so they compose into contracts and the client's reconciliation.

pub mod draw;
pub mod win;

pub use draw::{check_draw, is_draw_after};
pub use win::{Direction, WinningLine, check_win};
