//! Cooperative event loop for one session.
//!
//! A single task owns the [`GameClient`] and multiplexes inbound frames, UI
//! commands, connection changes and the ack deadline of the in-flight move.

use crate::client::GameClient;
use crate::error::SubmitError;
use crate::session::SessionState;
use crate::transport::{ConnectionState, Transport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strictly_gomoku::{Coord, Move};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, instrument, warn};

/// A frame delivered on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct InboundFrame {
    /// Topic the frame arrived on.
    pub topic: String,
    /// Raw JSON body.
    pub body: String,
}

/// Request from the UI side.
#[derive(Debug)]
pub enum Command {
    /// Submit a local move.
    Submit {
        /// Target intersection.
        coord: Coord,
        /// Receives the submission result.
        reply: oneshot::Sender<Result<Move, SubmitError>>,
    },
    /// Read the current state.
    Snapshot {
        /// Receives the snapshot.
        reply: oneshot::Sender<Arc<SessionState>>,
    },
    /// Leave the room and stop the loop.
    Leave {
        /// Signalled once the session is reset.
        reply: oneshot::Sender<()>,
    },
}

/// The driver stopped before answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Session driver stopped")]
pub struct DriverClosed;

/// Cloneable handle for feeding a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct DriverHandle {
    frames: mpsc::UnboundedSender<InboundFrame>,
    commands: mpsc::UnboundedSender<Command>,
}

impl DriverHandle {
    /// Queues an inbound frame.
    pub fn push_frame(&self, frame: InboundFrame) -> Result<(), DriverClosed> {
        self.frames.send(frame).map_err(|_| DriverClosed)
    }

    /// Submits a move and waits for the result.
    pub async fn submit(&self, coord: Coord) -> Result<Result<Move, SubmitError>, DriverClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Submit { coord, reply })
            .map_err(|_| DriverClosed)?;
        rx.await.map_err(|_| DriverClosed)
    }

    /// Fetches a state snapshot.
    pub async fn snapshot(&self) -> Result<Arc<SessionState>, DriverClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply })
            .map_err(|_| DriverClosed)?;
        rx.await.map_err(|_| DriverClosed)
    }

    /// Leaves the room; the driver stops afterwards.
    pub async fn leave(&self) -> Result<(), DriverClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Leave { reply })
            .map_err(|_| DriverClosed)?;
        rx.await.map_err(|_| DriverClosed)
    }
}

/// Owns a client and runs its event loop.
#[derive(Debug)]
pub struct SessionDriver<T> {
    client: GameClient<T>,
    frames: mpsc::UnboundedReceiver<InboundFrame>,
    commands: mpsc::UnboundedReceiver<Command>,
    connection: watch::Receiver<ConnectionState>,
}

impl<T: Transport> SessionDriver<T> {
    /// Wraps a client; returns the driver and its handle.
    pub fn new(client: GameClient<T>) -> (Self, DriverHandle) {
        let (frames_tx, frames) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let connection = client.transport().connection();
        let driver = Self {
            client,
            frames,
            commands,
            connection,
        };
        let handle = DriverHandle {
            frames: frames_tx,
            commands: commands_tx,
        };
        (driver, handle)
    }

    /// Runs until the handle is dropped or a leave command arrives.
    ///
    /// Returns the client so callers can inspect the final state.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> GameClient<T> {
        info!("Session driver started");
        let initial = *self.connection.borrow_and_update();
        self.client.set_connection(initial);
        let mut connection_open = true;

        loop {
            let deadline = self.client.pending_deadline();
            tokio::select! {
                // Authority frames drain first, then channel state and the deadline
                biased;

                frame = self.frames.recv() => {
                    let Some(frame) = frame else {
                        debug!("Frame channel closed");
                        break;
                    };
                    // Errors are logged by the client; the loop keeps going
                    let _ = self.client.handle_frame(&frame.topic, &frame.body);
                }
                changed = self.connection.changed(), if connection_open => {
                    match changed {
                        Ok(()) => {
                            let state = *self.connection.borrow_and_update();
                            self.client.set_connection(state);
                        }
                        Err(_) => {
                            warn!("Transport dropped its connection state");
                            connection_open = false;
                        }
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.client.expire_at(Instant::now());
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    if self.handle_command(command) {
                        break;
                    }
                }
            }
        }

        info!("Session driver stopped");
        self.client
    }

    /// Handles one command; returns true when the loop should stop.
    fn handle_command(&self, command: Command) -> bool {
        match command {
            Command::Submit { coord, reply } => {
                let result = self.client.submit(coord);
                if reply.send(result).is_err() {
                    debug!("Submit caller went away");
                }
                false
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.client.state());
                false
            }
            Command::Leave { reply } => {
                self.client.leave();
                let _ = reply.send(());
                true
            }
        }
    }
}
