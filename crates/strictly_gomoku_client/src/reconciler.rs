//! Reconciliation of inbound events against local state.
//!
//! Authority state always wins. Each event is applied in a single store
//! transaction, so it produces exactly one notification or, when it cannot
//! be reconciled, none at all.

use crate::error::ReconcileError;
use crate::protocol::{InboundEvent, MoveEcho, PlayerAssignment, RoomEvent, WireGameResult};
use crate::session::{PlayerId, RematchState, SessionState};
use crate::store::SessionStore;
use strictly_gomoku::{Board, Cell, GameStatus, Move, Outcome, Symbol, TurnState};
use tracing::{debug, info, instrument, warn};

/// Applies authority events to the session store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReconciler;

impl SyncReconciler {
    /// Reconciles one event. On error the store is unchanged.
    #[instrument(skip(store, event))]
    pub fn on_inbound_event(store: &SessionStore, event: InboundEvent) -> Result<(), ReconcileError> {
        let result = match event {
            InboundEvent::Move(echo) => store.transact(|state| apply_echo(state, echo)),
            InboundEvent::Room(room) => store.transact(|state| apply_room_event(state, room)),
        };
        if let Err(err) = &result {
            warn!(error = %err, "Event not reconciled; state unchanged");
        }
        result
    }
}

/// Applies a move echo.
fn apply_echo(state: &mut SessionState, mut echo: MoveEcho) -> Result<(), ReconcileError> {
    let last = state.session.last_sequence();
    if let Some(received) = echo.sequence
        && received < last
    {
        return Err(ReconcileError::StaleSequence { received, last });
    }

    // An echo for another placement means the authority never took ours
    if let Some(pending) = state.pending.take() {
        if pending.matches(&Move::new(echo.coord, echo.symbol, 0)) {
            debug!(mv = %pending.mv(), "In-flight move confirmed");
        } else {
            warn!(
                pending = %pending.mv(),
                echo_coord = %echo.coord,
                echo_symbol = %echo.symbol,
                "Echo diverges from in-flight move; undoing it"
            );
            pending.undo(state);
        }
    }

    let was_ended = state.session.status() == GameStatus::Ended;
    if state.session.status() == GameStatus::Waiting {
        info!("Echo arrived before game start; starting implicitly");
        state.session.turn_mut().start()?;
    }

    // Without an authority sequence a repeated echo of the last move keeps its number
    let sequence = echo.sequence.unwrap_or_else(|| match state.session.last_move() {
        Some(previous) if previous.coord == echo.coord && previous.player == echo.symbol => {
            previous.sequence
        }
        _ => last + 1,
    });
    let mv = Move::new(echo.coord, echo.symbol, sequence);

    state.board = match echo.board.take() {
        Some(snapshot) => {
            if snapshot != state.board {
                debug!("Authoritative snapshot replaces local board");
            }
            snapshot
        }
        None => match state.board.cell(mv.coord) {
            Some(Cell::Occupied(symbol)) if symbol == mv.player => {
                debug!(mv = %mv, "Echo confirms stone already on board");
                state.board.clone()
            }
            Some(Cell::Occupied(symbol)) => {
                warn!(mv = %mv, local = %symbol, "Authority overwrites divergent stone");
                state.board.with_cell(mv.coord, Cell::Occupied(mv.player))?
            }
            _ => state.board.apply(&mv)?,
        },
    };

    state.session.record_move(mv);

    let board = state.board.clone();
    let verdict = state.session.turn_mut().resolve_move(&board, &mv)?;
    if verdict.is_some() {
        return Ok(());
    }

    if echo.reports_ended() {
        if !was_ended {
            apply_echo_result(state.session.turn_mut(), &echo)?;
        }
        return Ok(());
    }

    if let Some(next) = &echo.next_turn_player_id
        && state.session.status() == GameStatus::Playing
    {
        match state.session.symbol_of(next) {
            Some(symbol) => state.session.turn_mut().set_turn(symbol)?,
            None => debug!(player_id = %next, "Next mover not seated; keeping alternation"),
        }
    }
    Ok(())
}

/// Ends the game with the verdict reported by a move echo.
fn apply_echo_result(turn: &mut TurnState, echo: &MoveEcho) -> Result<(), ReconcileError> {
    match echo.game_result {
        WireGameResult::Win => turn.finish(Outcome::Winner(echo.symbol), None)?,
        WireGameResult::Draw => turn.finish(Outcome::Draw, None)?,
        WireGameResult::Surrender | WireGameResult::Ongoing => turn.end_without_verdict()?,
    }
    Ok(())
}

/// Applies a room lifecycle event.
fn apply_room_event(state: &mut SessionState, event: RoomEvent) -> Result<(), ReconcileError> {
    match event {
        RoomEvent::PlayerJoined {
            player_id,
            player_name,
        } => {
            if state.session.seat_player(player_id, player_name).is_none() {
                debug!("Join ignored; room is full");
            }
        }
        RoomEvent::PlayerLeft { player_id } => player_left(state, player_id)?,
        RoomEvent::PlayerReady { player_id } => {
            if !state.session.mark_ready(&player_id) {
                return Err(ReconcileError::UnknownPlayer(player_id));
            }
        }
        RoomEvent::GameStarted { players } => game_started(state, players)?,
        RoomEvent::GameEnded {
            game_result,
            winner_id,
        } => game_ended(state, game_result, winner_id)?,
        RoomEvent::RematchRequested { player_id } => {
            info!(player_id = %player_id, "Rematch requested");
            state.session.rematch_mut().request(player_id);
        }
        RoomEvent::RematchAccepted { player_id } => {
            info!(player_id = ?player_id, "Rematch accepted");
            state.session.rematch_mut().accept();
        }
        RoomEvent::RematchCreated { new_room_id } => {
            info!(new_room_id = %new_room_id, "Rematch room created");
            state.session.rematch_mut().created(new_room_id);
        }
        RoomEvent::RoomStatusChanged { status } => {
            debug!(%status, "Room status changed");
            state.session.set_room_status(status);
        }
    }
    Ok(())
}

fn player_left(state: &mut SessionState, player_id: PlayerId) -> Result<(), ReconcileError> {
    state.pending = None;
    match state.session.status() {
        GameStatus::Playing => {
            let symbol = state
                .session
                .symbol_of(&player_id)
                .ok_or_else(|| ReconcileError::UnknownPlayer(player_id.clone()))?;
            info!(player_id = %player_id, %symbol, "Player left mid-game; opponent wins");
            state
                .session
                .turn_mut()
                .finish(Outcome::Winner(symbol.opponent()), None)?;
        }
        GameStatus::Waiting | GameStatus::Ended => {
            if state.session.unseat_player(&player_id).is_none() {
                debug!(player_id = %player_id, "Leaving player was not seated");
            }
        }
    }
    Ok(())
}

fn game_started(state: &mut SessionState, players: Vec<PlayerAssignment>) -> Result<(), ReconcileError> {
    check_seating(&players)?;
    state.session.clear_seats();
    state.session.set_local_symbol(None);
    for player in players {
        state
            .session
            .assign_seat(player.player_id, player.symbol, player.player_name);
    }
    state.board = Board::new();
    state.pending = None;
    state.session.restore_history(None, 0);
    *state.session.rematch_mut() = RematchState::default();
    *state.session.turn_mut() = TurnState::new();
    state.session.turn_mut().start()?;
    info!(local_symbol = ?state.session.local_symbol(), "Game started");
    Ok(())
}

/// A started game seats two distinct players, one per symbol.
fn check_seating(players: &[PlayerAssignment]) -> Result<(), ReconcileError> {
    let holding = |symbol: Symbol| players.iter().filter(|p| p.symbol == symbol).count();
    if players.len() != 2 || holding(Symbol::X) != 1 || holding(Symbol::O) != 1 {
        let symbols: Vec<String> = players.iter().map(|p| p.symbol.to_string()).collect();
        return Err(ReconcileError::InvalidSeating(format!(
            "expected one X and one O, got [{}]",
            symbols.join(", ")
        )));
    }
    if players[0].player_id == players[1].player_id {
        return Err(ReconcileError::InvalidSeating(format!(
            "player {} holds both seats",
            players[0].player_id
        )));
    }
    Ok(())
}

fn game_ended(
    state: &mut SessionState,
    result: WireGameResult,
    winner_id: Option<PlayerId>,
) -> Result<(), ReconcileError> {
    state.pending = None;
    let winner = winner_id.and_then(|id| {
        let symbol = state.session.symbol_of(&id);
        if symbol.is_none() {
            warn!(winner_id = %id, "Winner is not seated in this room");
        }
        symbol
    });
    let outcome = match (result, winner) {
        (WireGameResult::Draw, _) => Some(Outcome::Draw),
        (WireGameResult::Win | WireGameResult::Surrender, Some(symbol)) => {
            Some(Outcome::Winner(symbol))
        }
        _ => None,
    };
    let turn = state.session.turn_mut();
    match outcome {
        // Keep the locally detected winning line when the authority agrees
        Some(outcome) if turn.outcome() == Some(outcome) => {}
        Some(outcome) => turn.finish(outcome, None)?,
        None => turn.end_without_verdict()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RoomId;
    use strictly_gomoku::Coord;

    fn store() -> SessionStore {
        SessionStore::for_room(RoomId::new("r"), PlayerId::new("alice"))
    }

    fn started(store: &SessionStore) {
        let event = RoomEvent::GameStarted {
            players: vec![
                PlayerAssignment {
                    player_id: PlayerId::new("alice"),
                    symbol: Symbol::X,
                    player_name: None,
                },
                PlayerAssignment {
                    player_id: PlayerId::new("bob"),
                    symbol: Symbol::O,
                    player_name: None,
                },
            ],
        };
        SyncReconciler::on_inbound_event(store, event.into()).expect("starts");
    }

    fn echo(row: usize, col: usize, symbol: Symbol, sequence: Option<u64>) -> MoveEcho {
        MoveEcho {
            coord: Coord::new(row, col),
            symbol,
            player_id: PlayerId::new(if symbol == Symbol::X { "alice" } else { "bob" }),
            next_turn_player_id: None,
            board: None,
            sequence,
            game_state: crate::protocol::WireGameState::Ongoing,
            game_result: WireGameResult::Ongoing,
        }
    }

    #[test]
    fn test_echo_applies_and_alternates() {
        let store = store();
        started(&store);
        SyncReconciler::on_inbound_event(&store, echo(7, 7, Symbol::X, Some(1)).into())
            .expect("applies");
        let state = store.state();
        assert_eq!(state.board().cell(Coord::new(7, 7)), Some(Cell::Occupied(Symbol::X)));
        assert_eq!(state.session().current_turn(), Symbol::O);
        assert_eq!(state.session().last_sequence(), 1);
    }

    #[test]
    fn test_next_turn_player_overrides_alternation() {
        let store = store();
        started(&store);
        let mut event = echo(7, 7, Symbol::X, Some(1));
        event.next_turn_player_id = Some(PlayerId::new("alice"));
        SyncReconciler::on_inbound_event(&store, event.into()).expect("applies");
        assert_eq!(store.state().session().current_turn(), Symbol::X);
    }

    #[test]
    fn test_stale_echo_dropped() {
        let store = store();
        started(&store);
        SyncReconciler::on_inbound_event(&store, echo(7, 7, Symbol::X, Some(5)).into())
            .expect("applies");
        let before = store.state();
        let err = SyncReconciler::on_inbound_event(&store, echo(0, 0, Symbol::O, Some(4)).into())
            .expect_err("stale");
        assert_eq!(err, ReconcileError::StaleSequence { received: 4, last: 5 });
        assert_eq!(*store.state(), *before);
    }

    #[test]
    fn test_echo_while_waiting_starts_game() {
        let store = store();
        SyncReconciler::on_inbound_event(&store, echo(3, 3, Symbol::X, None).into())
            .expect("applies");
        let state = store.state();
        assert_eq!(state.session().status(), GameStatus::Playing);
        assert_eq!(state.session().current_turn(), Symbol::O);
    }

    #[test]
    fn test_divergent_stone_overwritten() {
        let store = store();
        started(&store);
        store.update(|state| {
            state.board = state
                .board
                .apply(&Move::new(Coord::new(2, 2), Symbol::O, 0))
                .expect("vacant");
        });
        SyncReconciler::on_inbound_event(&store, echo(2, 2, Symbol::X, Some(1)).into())
            .expect("authority wins");
        assert_eq!(
            store.state().board().cell(Coord::new(2, 2)),
            Some(Cell::Occupied(Symbol::X))
        );
    }

    #[test]
    fn test_authority_reported_win() {
        let store = store();
        started(&store);
        let mut event = echo(0, 0, Symbol::X, Some(1));
        event.game_state = crate::protocol::WireGameState::Ended;
        event.game_result = WireGameResult::Win;
        SyncReconciler::on_inbound_event(&store, event.into()).expect("applies");
        let state = store.state();
        assert_eq!(state.session().status(), GameStatus::Ended);
        assert_eq!(state.session().winner(), Some(Outcome::Winner(Symbol::X)));
        assert!(state.session().winning_line().is_empty());
    }

    #[test]
    fn test_game_start_with_shared_symbol_rejected() {
        let store = store();
        let before = store.state();
        let event = RoomEvent::GameStarted {
            players: vec![
                PlayerAssignment {
                    player_id: PlayerId::new("alice"),
                    symbol: Symbol::X,
                    player_name: None,
                },
                PlayerAssignment {
                    player_id: PlayerId::new("bob"),
                    symbol: Symbol::X,
                    player_name: None,
                },
            ],
        };
        let err = SyncReconciler::on_inbound_event(&store, event.into()).expect_err("two X seats");
        assert!(matches!(err, ReconcileError::InvalidSeating(_)));
        assert_eq!(*store.state(), *before);
    }

    #[test]
    fn test_diverging_echo_with_snapshot_clears_local_win() {
        let store = store();
        started(&store);
        store.update(|state| {
            for col in 0..4 {
                state.board = state
                    .board
                    .apply(&Move::new(Coord::new(7, col), Symbol::X, 0))
                    .expect("vacant");
            }
        });
        let transport = crate::transport::MemoryTransport::connected();
        let now = tokio::time::Instant::now();
        crate::controller::OptimisticMoveController::new(
            std::time::Duration::from_secs(2),
            crate::config::TimeoutPolicy::Rollback,
        )
        .submit(&store, &transport, "/app/game/r/move", Coord::new(7, 4), now)
        .expect("winning move");
        assert_eq!(store.state().session().status(), GameStatus::Ended);

        let mut event = echo(3, 3, Symbol::O, Some(1));
        event.board = Some(
            Board::new()
                .with_cell(Coord::new(3, 3), Cell::Occupied(Symbol::O))
                .expect("in bounds"),
        );
        SyncReconciler::on_inbound_event(&store, event.into()).expect("authority wins");

        let state = store.state();
        assert!(state.pending().is_none());
        assert_eq!(state.session().status(), GameStatus::Playing);
        assert_eq!(state.session().winner(), None);
        assert_eq!(state.session().current_turn(), Symbol::X);
        assert_eq!(state.board().count(Symbol::X), 0);
    }

    #[test]
    fn test_player_left_mid_game() {
        let store = store();
        started(&store);
        SyncReconciler::on_inbound_event(
            &store,
            RoomEvent::PlayerLeft {
                player_id: PlayerId::new("bob"),
            }
            .into(),
        )
        .expect("applies");
        assert_eq!(store.state().session().winner(), Some(Outcome::Winner(Symbol::X)));
    }

    #[test]
    fn test_ready_for_unknown_player_rejected() {
        let store = store();
        let err = SyncReconciler::on_inbound_event(
            &store,
            RoomEvent::PlayerReady {
                player_id: PlayerId::new("ghost"),
            }
            .into(),
        )
        .expect_err("not seated");
        assert_eq!(err, ReconcileError::UnknownPlayer(PlayerId::new("ghost")));
    }

    #[test]
    fn test_game_ended_while_waiting_rejected() {
        let store = store();
        let before = store.state();
        let event = RoomEvent::GameEnded {
            game_result: WireGameResult::Draw,
            winner_id: None,
        };
        assert!(SyncReconciler::on_inbound_event(&store, event.into()).is_err());
        assert_eq!(*store.state(), *before);
    }

    #[test]
    fn test_game_ended_names_winner() {
        let store = store();
        started(&store);
        let event = RoomEvent::GameEnded {
            game_result: WireGameResult::Surrender,
            winner_id: Some(PlayerId::new("bob")),
        };
        SyncReconciler::on_inbound_event(&store, event.into()).expect("applies");
        assert_eq!(store.state().session().winner(), Some(Outcome::Winner(Symbol::O)));
    }
}
