//! Session state for one room.
//!
//! [`SessionState`] is the single value held by the
//! [`SessionStore`](crate::SessionStore): game session, board, the in-flight
//! move and the channel's connection state.

use crate::transport::ConnectionState;
use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use strictly_gomoku::{Board, Coord, GameStatus, Move, Outcome, Symbol, TurnState};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Ids arrive as strings or integers depending on the sender.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

fn id_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match WireId::deserialize(deserializer)? {
        WireId::Text(s) => s,
        WireId::Number(n) => n.to_string(),
    })
}

/// Unique identifier for a player.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct PlayerId(#[serde(deserialize_with = "id_from_wire")] String);

impl PlayerId {
    /// Creates a player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a room.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
pub struct RoomId(#[serde(deserialize_with = "id_from_wire")] String);

impl RoomId {
    /// Creates a room id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A player seated in the room.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_new::new)]
pub struct Seat {
    /// Player's id.
    id: PlayerId,
    /// Display name, when announced.
    name: Option<String>,
    /// Whether the player signalled readiness.
    #[new(default)]
    ready: bool,
}

/// Rematch negotiation after a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters)]
pub struct RematchState {
    /// Player who asked for a rematch.
    requested_by: Option<PlayerId>,
    /// Whether the request was accepted.
    accepted: bool,
    /// Room created by the authority for the rematch.
    new_room: Option<RoomId>,
}

impl RematchState {
    pub(crate) fn request(&mut self, by: PlayerId) {
        self.requested_by = Some(by);
    }

    pub(crate) fn accept(&mut self) {
        self.accepted = true;
    }

    pub(crate) fn created(&mut self, room: RoomId) {
        self.new_room = Some(room);
    }
}

fn seat_index(symbol: Symbol) -> usize {
    match symbol {
        Symbol::X => 0,
        Symbol::O => 1,
    }
}

fn seat_symbol(index: usize) -> Symbol {
    if index == 0 { Symbol::X } else { Symbol::O }
}

/// A game session in one room.
///
/// Seats are an ordered pair: the `X` seat moves first, the `O` seat second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    room_id: RoomId,
    local_player: PlayerId,
    local_symbol: Option<Symbol>,
    seats: [Option<Seat>; 2],
    turn: TurnState,
    last_move: Option<Move>,
    last_sequence: u64,
    rematch: RematchState,
    room_status: Option<String>,
}

impl GameSession {
    /// Creates a waiting session for the local player.
    #[instrument]
    pub fn new(room_id: RoomId, local_player: PlayerId) -> Self {
        info!(room_id = %room_id, player_id = %local_player, "Creating game session");
        Self {
            room_id,
            local_player,
            local_symbol: None,
            seats: [None, None],
            turn: TurnState::new(),
            last_move: None,
            last_sequence: 0,
            rematch: RematchState::default(),
            room_status: None,
        }
    }

    /// Returns the room id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns the local player's id.
    pub fn local_player(&self) -> &PlayerId {
        &self.local_player
    }

    /// Returns the local player's symbol, once assigned.
    pub fn local_symbol(&self) -> Option<Symbol> {
        self.local_symbol
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.turn.status()
    }

    /// Returns the symbol expected to move next.
    pub fn current_turn(&self) -> Symbol {
        self.turn.current_turn()
    }

    /// Returns the verdict of an ended game.
    pub fn winner(&self) -> Option<Outcome> {
        self.turn.outcome()
    }

    /// Returns the winning run, empty unless a player won.
    pub fn winning_line(&self) -> &[Coord] {
        self.turn.winning_line()
    }

    /// Returns the turn state.
    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    /// Returns the last applied move.
    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// Returns the last authoritative sequence applied.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Returns the rematch negotiation state.
    pub fn rematch(&self) -> &RematchState {
        &self.rematch
    }

    /// Returns the last room status announced by the authority.
    pub fn room_status(&self) -> Option<&str> {
        self.room_status.as_deref()
    }

    /// Returns the seat playing `symbol`.
    pub fn seat(&self, symbol: Symbol) -> Option<&Seat> {
        self.seats[seat_index(symbol)].as_ref()
    }

    /// Returns the symbol of a seated player.
    pub fn symbol_of(&self, player: &PlayerId) -> Option<Symbol> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().is_some_and(|s| s.id() == player))
            .map(seat_symbol)
    }

    /// True if it is the local player's move.
    pub fn is_local_turn(&self) -> bool {
        self.local_symbol
            .is_some_and(|symbol| self.turn.is_legal_for(symbol))
    }

    pub(crate) fn turn_mut(&mut self) -> &mut TurnState {
        &mut self.turn
    }

    pub(crate) fn rematch_mut(&mut self) -> &mut RematchState {
        &mut self.rematch
    }

    pub(crate) fn set_local_symbol(&mut self, symbol: Option<Symbol>) {
        self.local_symbol = symbol;
    }

    pub(crate) fn set_room_status(&mut self, status: String) {
        self.room_status = Some(status);
    }

    pub(crate) fn record_move(&mut self, mv: Move) {
        self.last_sequence = self.last_sequence.max(mv.sequence);
        self.last_move = Some(mv);
    }

    pub(crate) fn restore_history(&mut self, last_move: Option<Move>, last_sequence: u64) {
        self.last_move = last_move;
        self.last_sequence = last_sequence;
    }

    /// Seats a joining player in the first free seat.
    ///
    /// Returns the provisional symbol; `GAME_STARTED` may reassign it.
    #[instrument(skip(self), fields(room_id = %self.room_id))]
    pub(crate) fn seat_player(&mut self, id: PlayerId, name: Option<String>) -> Option<Symbol> {
        if let Some(symbol) = self.symbol_of(&id) {
            debug!(player_id = %id, %symbol, "Player already seated");
            return Some(symbol);
        }
        let Some(index) = self.seats.iter().position(Option::is_none) else {
            warn!(player_id = %id, "Room already has 2 players");
            return None;
        };
        info!(player_id = %id, symbol = %seat_symbol(index), "Seating player");
        self.seats[index] = Some(Seat::new(id, name));
        Some(seat_symbol(index))
    }

    /// Removes a player; returns the symbol they held.
    pub(crate) fn unseat_player(&mut self, id: &PlayerId) -> Option<Symbol> {
        let symbol = self.symbol_of(id)?;
        self.seats[seat_index(symbol)] = None;
        Some(symbol)
    }

    /// Marks a seated player ready.
    pub(crate) fn mark_ready(&mut self, id: &PlayerId) -> bool {
        match self.symbol_of(id) {
            Some(symbol) => {
                if let Some(seat) = self.seats[seat_index(symbol)].as_mut() {
                    seat.ready = true;
                }
                true
            }
            None => false,
        }
    }

    /// Places a player in the seat for `symbol`, keeping a known name.
    pub(crate) fn assign_seat(&mut self, id: PlayerId, symbol: Symbol, name: Option<String>) {
        let name = name.or_else(|| {
            self.seats
                .iter()
                .flatten()
                .find(|seat| seat.id() == &id)
                .and_then(|seat| seat.name().clone())
        });
        if id == self.local_player {
            self.local_symbol = Some(symbol);
        }
        self.seats[seat_index(symbol)] = Some(Seat::new(id, name));
    }

    /// Clears both seats before a fresh assignment.
    pub(crate) fn clear_seats(&mut self) {
        self.seats = [None, None];
    }
}

/// Pre-move state captured so an optimistic move can be undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rollback {
    pub(crate) board: Board,
    pub(crate) turn: TurnState,
    pub(crate) last_move: Option<Move>,
    pub(crate) last_sequence: u64,
}

impl Rollback {
    pub(crate) fn capture(state: &SessionState) -> Self {
        Self {
            board: state.board.clone(),
            turn: state.session.turn.clone(),
            last_move: state.session.last_move,
            last_sequence: state.session.last_sequence,
        }
    }

    pub(crate) fn restore(self, state: &mut SessionState) {
        state.board = self.board;
        state.session.turn = self.turn;
        state.session.restore_history(self.last_move, self.last_sequence);
    }

    /// Restores board, history and turn owner but keeps the lifecycle phase.
    fn restore_position(self, state: &mut SessionState) {
        state.board = self.board;
        state.session.restore_history(self.last_move, self.last_sequence);
        if state.session.status() == GameStatus::Playing {
            state.session.turn.set_turn(self.turn.current_turn()).ok();
        }
    }
}

/// The single unacknowledged local move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    mv: Move,
    submitted_at: Instant,
    acked: bool,
    rollback: Rollback,
    applied_status: GameStatus,
}

impl PendingMove {
    /// `applied_status` is the lifecycle phase the optimistic move left behind.
    pub(crate) fn new(
        mv: Move,
        submitted_at: Instant,
        rollback: Rollback,
        applied_status: GameStatus,
    ) -> Self {
        Self {
            mv,
            submitted_at,
            acked: false,
            rollback,
            applied_status,
        }
    }

    /// Returns the submitted move.
    pub fn mv(&self) -> &Move {
        &self.mv
    }

    /// Returns when the move was submitted.
    pub fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// True once the channel accepted the outbound frame.
    pub fn acked(&self) -> bool {
        self.acked
    }

    /// Instant after which the move counts as unacknowledged.
    pub fn deadline(&self, timeout: Duration) -> Instant {
        self.submitted_at + timeout
    }

    /// True if `mv` confirms this pending move.
    pub fn matches(&self, mv: &Move) -> bool {
        self.mv.same_placement(mv)
    }

    pub(crate) fn mark_acked(&mut self) {
        self.acked = true;
    }

    /// Takes the optimistic move back off `state`.
    ///
    /// Only the reconciler moves the lifecycle after the optimistic move was
    /// applied; a phase it set is kept and only the position is restored.
    pub(crate) fn undo(self, state: &mut SessionState) {
        if state.session.status() == self.applied_status {
            self.rollback.restore(state);
        } else {
            debug!(
                mv = %self.mv,
                status = %state.session.status(),
                "Lifecycle changed while move was in flight; keeping phase"
            );
            self.rollback.restore_position(state);
        }
    }
}

/// Everything the store holds, as one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) session: GameSession,
    pub(crate) board: Board,
    pub(crate) pending: Option<PendingMove>,
    pub(crate) connection: ConnectionState,
}

impl SessionState {
    /// A waiting session with an empty board and no pending move.
    pub fn fresh(room_id: RoomId, local_player: PlayerId) -> Self {
        Self {
            session: GameSession::new(room_id, local_player),
            board: Board::new(),
            pending: None,
            connection: ConnectionState::default(),
        }
    }

    /// Returns the game session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Returns the current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the in-flight move, if any.
    pub fn pending(&self) -> Option<&PendingMove> {
        self.pending.as_ref()
    }

    /// Returns the channel's connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(RoomId::new("room-1"), PlayerId::new("alice"))
    }

    #[test]
    fn test_new_session_is_waiting() {
        let session = session();
        assert_eq!(session.status(), GameStatus::Waiting);
        assert_eq!(session.local_symbol(), None);
        assert!(!session.is_local_turn());
    }

    #[test]
    fn test_seating_fills_x_then_o() {
        let mut session = session();
        assert_eq!(session.seat_player(PlayerId::new("alice"), None), Some(Symbol::X));
        assert_eq!(session.seat_player(PlayerId::new("bob"), None), Some(Symbol::O));
        assert_eq!(session.seat_player(PlayerId::new("carol"), None), None);
        // Re-joining keeps the seat
        assert_eq!(session.seat_player(PlayerId::new("bob"), None), Some(Symbol::O));
    }

    #[test]
    fn test_assign_seat_sets_local_symbol() {
        let mut session = session();
        session.assign_seat(PlayerId::new("alice"), Symbol::O, Some("Alice".into()));
        assert_eq!(session.local_symbol(), Some(Symbol::O));
        assert_eq!(
            session.seat(Symbol::O).and_then(|s| s.name().clone()),
            Some("Alice".to_string())
        );
    }

    #[test]
    fn test_unseat_and_ready() {
        let mut session = session();
        session.seat_player(PlayerId::new("bob"), None);
        assert!(session.mark_ready(&PlayerId::new("bob")));
        assert_eq!(session.seat(Symbol::X).map(|s| *s.ready()), Some(true));
        assert_eq!(session.unseat_player(&PlayerId::new("bob")), Some(Symbol::X));
        assert!(!session.mark_ready(&PlayerId::new("bob")));
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let numeric: PlayerId = serde_json::from_str("42").expect("number id");
        let text: PlayerId = serde_json::from_str("\"42\"").expect("string id");
        assert_eq!(numeric, text);
        assert!(serde_json::from_str::<RoomId>("true").is_err());
    }
}
