//! Wire shapes for cells and boards.

use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize};
use strictly_gomoku::{BOARD_SIZE, Board, Cell, Symbol};

/// A cell as sent by the authority.
///
/// `null`, `""`, `" "`, `"."` and `"EMPTY"` are empty; `"X"` and `"O"` are
/// stones. Anything else fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub struct WireCell(pub Cell);

impl TryFrom<Option<String>> for WireCell {
    type Error = String;

    fn try_from(raw: Option<String>) -> Result<Self, Self::Error> {
        let Some(raw) = raw else {
            return Ok(WireCell(Cell::Empty));
        };
        match raw.trim() {
            "" | "." | "EMPTY" => Ok(WireCell(Cell::Empty)),
            other => Symbol::from_wire(other)
                .map(|symbol| WireCell(Cell::Occupied(symbol)))
                .ok_or_else(|| format!("invalid cell value {:?}", raw)),
        }
    }
}

impl From<WireCell> for Option<String> {
    fn from(cell: WireCell) -> Self {
        cell.0.symbol().map(|symbol| symbol.to_string())
    }
}

/// Deserializes a symbol from its lenient wire spelling.
pub(crate) fn symbol_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Symbol, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Symbol::from_wire(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid player symbol {:?}", raw)))
}

/// Converts a decoded grid into a board, enforcing 15x15.
pub fn board_from_wire(rows: Vec<Vec<WireCell>>) -> Result<Board, ProtocolError> {
    if rows.len() != BOARD_SIZE {
        return Err(ProtocolError::new(format!(
            "board has {} rows, expected {}",
            rows.len(),
            BOARD_SIZE
        )));
    }
    let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
    for (row, wire_row) in rows.into_iter().enumerate() {
        if wire_row.len() != BOARD_SIZE {
            return Err(ProtocolError::new(format!(
                "board row {} has {} cells, expected {}",
                row,
                wire_row.len(),
                BOARD_SIZE
            )));
        }
        for (col, cell) in wire_row.into_iter().enumerate() {
            cells[row][col] = cell.0;
        }
    }
    Ok(Board::from_rows(cells))
}

/// Converts a board into the wire grid.
pub fn board_to_wire(board: &Board) -> Vec<Vec<WireCell>> {
    board
        .rows()
        .iter()
        .map(|row| row.iter().map(|cell| WireCell(*cell)).collect())
        .collect()
}
