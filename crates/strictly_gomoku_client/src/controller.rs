//! Optimistic move submission.
//!
//! A validated move is applied to the local board at once, then sent. The
//! session keeps exactly one [`PendingMove`] until the authority echoes it
//! back or the ack timeout expires.

use crate::config::{ClientConfig, TimeoutPolicy};
use crate::error::SubmitError;
use crate::protocol::OutboundMove;
use crate::session::{PendingMove, Rollback, SessionState};
use crate::store::SessionStore;
use crate::transport::Transport;
use crate::validator::{MoveRejection, MoveValidator};
use std::time::Duration;
use strictly_gomoku::{Coord, Move};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Applies local moves speculatively and tracks the one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticMoveController {
    ack_timeout: Duration,
    policy: TimeoutPolicy,
}

impl OptimisticMoveController {
    /// Creates a controller.
    pub fn new(ack_timeout: Duration, policy: TimeoutPolicy) -> Self {
        Self {
            ack_timeout,
            policy,
        }
    }

    /// Creates a controller from client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.ack_timeout(), *config.timeout_policy())
    }

    /// Time allowed for an echo.
    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }

    /// Handling of expired moves.
    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Deadline of the in-flight move, if any.
    pub fn deadline(&self, state: &SessionState) -> Option<Instant> {
        state.pending().map(|pending| pending.deadline(self.ack_timeout))
    }

    /// Validates, applies and sends a local move.
    ///
    /// A rejection leaves the store untouched and sends nothing. A transport
    /// failure restores the pre-move board and turn so the move can be
    /// retried.
    #[instrument(skip(self, store, transport), fields(coord = %coord))]
    pub fn submit<T: Transport + ?Sized>(
        &self,
        store: &SessionStore,
        transport: &T,
        destination: &str,
        coord: Coord,
        now: Instant,
    ) -> Result<Move, SubmitError> {
        let body = OutboundMove::from(coord).to_body()?;
        let mv = store.transact(|state| apply_optimistic(state, coord, now))?;
        info!(mv = %mv, "Move applied optimistically");

        if let Err(err) = transport.send(destination, &body) {
            warn!(mv = %mv, error = %err, "Send failed; undoing optimistic move");
            store.update(|state| {
                if let Some(pending) = state.pending.take_if(|pending| pending.matches(&mv)) {
                    pending.undo(state);
                }
            });
            return Err(err.into());
        }

        store.update(|state| {
            if let Some(pending) = state.pending.as_mut().filter(|pending| pending.matches(&mv)) {
                pending.mark_acked();
            }
        });
        debug!(destination, "Move sent");
        Ok(mv)
    }

    /// Clears the in-flight move if its deadline has passed.
    ///
    /// Under [`TimeoutPolicy::Rollback`] the board and turn return to their
    /// pre-move values; under [`TimeoutPolicy::KeepOptimistic`] only the lock
    /// is released. Returns the expired move.
    #[instrument(skip(self, store))]
    pub fn expire_pending(&self, store: &SessionStore, now: Instant) -> Option<Move> {
        let timeout = self.ack_timeout;
        let policy = self.policy;
        store
            .transact(|state| {
                let pending = state
                    .pending
                    .take_if(|pending| now >= pending.deadline(timeout))
                    .ok_or(())?;
                let mv = *pending.mv();
                match policy {
                    TimeoutPolicy::Rollback => pending.undo(state),
                    TimeoutPolicy::KeepOptimistic => {}
                }
                Ok::<_, ()>(mv)
            })
            .inspect(|mv| warn!(mv = %mv, %policy, "Move unacknowledged; lock released"))
            .ok()
    }
}

fn apply_optimistic(state: &mut SessionState, coord: Coord, now: Instant) -> Result<Move, MoveRejection> {
    MoveValidator::validate(state, coord)?;
    let symbol = state
        .session
        .local_symbol()
        .ok_or(MoveRejection::NotYourTurn)?;
    let mv = Move::new(coord, symbol, state.session.last_sequence() + 1);
    let rollback = Rollback::capture(state);

    let board = state.board.apply(&mv)?;
    state
        .session
        .turn_mut()
        .resolve_move(&board, &mv)
        .map_err(|_| MoveRejection::GameNotActive)?;
    state.board = board;
    // The provisional sequence stays off the session until the echo confirms it
    let last_sequence = state.session.last_sequence();
    state.session.restore_history(Some(mv), last_sequence);
    let applied_status = state.session.status();
    state.pending = Some(PendingMove::new(mv, now, rollback, applied_status));
    Ok(mv)
}
