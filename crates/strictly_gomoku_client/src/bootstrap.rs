//! One-shot reads made when a session starts.

use crate::error::BootstrapError;
use crate::protocol::{WireCell, board_from_wire};
use crate::session::{PlayerId, RoomId, SessionState};
use serde::Deserialize;
use strictly_gomoku::{Board, GameStatus, Symbol};
use tracing::{debug, info, instrument};

/// Source of the initial board and the local player's symbol.
#[async_trait::async_trait]
pub trait BootstrapSource: Send + Sync {
    /// Fetches the current board of a room.
    async fn fetch_board(&self, room: &RoomId) -> Result<Board, BootstrapError>;

    /// Fetches the symbol assigned to a player, if any.
    async fn fetch_symbol(
        &self,
        room: &RoomId,
        player: &PlayerId,
    ) -> Result<Option<Symbol>, BootstrapError>;
}

#[derive(Deserialize)]
struct BoardResponse {
    board: Vec<Vec<WireCell>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolResponse {
    #[serde(default)]
    player_symbol: Option<String>,
}

/// Bootstrap over the authority's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBootstrap {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBootstrap {
    /// Creates a bootstrap client for `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<R: for<'de> Deserialize<'de>>(&self, url: String) -> Result<R, BootstrapError> {
        debug!(%url, "Bootstrap request");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| BootstrapError::new(format!("Malformed response from {}: {}", url, e)))
    }
}

#[async_trait::async_trait]
impl BootstrapSource for HttpBootstrap {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_board(&self, room: &RoomId) -> Result<Board, BootstrapError> {
        let response: BoardResponse = self
            .get(format!("{}/games/{}/board", self.base_url, room))
            .await?;
        Ok(board_from_wire(response.board)?)
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_symbol(
        &self,
        room: &RoomId,
        player: &PlayerId,
    ) -> Result<Option<Symbol>, BootstrapError> {
        let response: SymbolResponse = self
            .get(format!("{}/games/{}/players/{}/symbol", self.base_url, room, player))
            .await?;
        match response.player_symbol {
            None => Ok(None),
            Some(raw) => Symbol::from_wire(&raw)
                .map(Some)
                .ok_or_else(|| BootstrapError::new(format!("Invalid player symbol {:?}", raw))),
        }
    }
}

/// Folds bootstrap results into a session.
///
/// A board with stones starts a waiting game; the side to move follows from
/// stone parity. An in-flight move keeps its optimistic turn.
pub(crate) fn apply_bootstrap(state: &mut SessionState, board: Board, symbol: Option<Symbol>) {
    if let Some(symbol) = symbol {
        let local = state.session.local_player().clone();
        state.session.assign_seat(local, symbol, None);
    }
    let stones = board.count(Symbol::X) + board.count(Symbol::O);
    state.board = board;
    let turn = state.session.turn_mut();
    if stones > 0 && turn.status() == GameStatus::Waiting && turn.start().is_ok() {
        info!(stones, "Bootstrap board has stones; game in progress");
    }
    if state.pending.is_none() && state.session.status() == GameStatus::Playing {
        let next = if state.board.count(Symbol::X) > state.board.count(Symbol::O) {
            Symbol::O
        } else {
            Symbol::X
        };
        if state.session.turn_mut().set_turn(next).is_ok() {
            debug!(%next, "Turn derived from stone parity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_gomoku::{Coord, Move};

    #[test]
    fn test_board_with_stones_starts_game() {
        let mut state = SessionState::fresh(RoomId::new("r"), PlayerId::new("alice"));
        let board = Board::new()
            .apply(&Move::new(Coord::new(7, 7), Symbol::X, 1))
            .expect("vacant");
        apply_bootstrap(&mut state, board, Some(Symbol::O));
        assert_eq!(state.session().status(), GameStatus::Playing);
        assert_eq!(state.session().current_turn(), Symbol::O);
        assert_eq!(state.session().local_symbol(), Some(Symbol::O));
        assert!(state.session().is_local_turn());
    }

    #[test]
    fn test_empty_board_keeps_waiting() {
        let mut state = SessionState::fresh(RoomId::new("r"), PlayerId::new("alice"));
        apply_bootstrap(&mut state, Board::new(), None);
        assert_eq!(state.session().status(), GameStatus::Waiting);
        assert_eq!(state.session().local_symbol(), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(HttpBootstrap::new("http://host/api/").base_url(), "http://host/api");
    }
}
