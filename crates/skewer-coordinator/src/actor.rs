//! The coordinator actor: serializes all protocol events onto a single task.
//!
//! Everything that touches coordinator state goes through one mpsc channel,
//! so the [`Coordinator`] itself needs no locks and event ordering within a
//! room is the channel order. Reap timers are spawned tasks that sleep and
//! then feed a [`CoordinatorCommand::Reap`] back into the same channel, which
//! keeps the re-validation inside the single-threaded state machine.

use skewer_engine::RulesEngine;
use skewer_protocol::{MoveSpec, SeatToken, SessionId, SessionSummary};
use skewer_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::config::CoordinatorConfig;
use crate::coordinator::Coordinator;
use crate::error::CoordinatorError;
use crate::router::EventSender;

/// Commands processed by the coordinator task.
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// A new connection is ready to receive events.
    Connect {
        connection: ConnectionId,
        sender: EventSender,
    },
    /// The connection's socket is gone.
    Disconnect { connection: ConnectionId },
    /// Client sent `requestMatch`.
    RequestMatch { connection: ConnectionId },
    /// Client sent `joinSession`.
    Join {
        connection: ConnectionId,
        session_id: SessionId,
        token: Option<SeatToken>,
    },
    /// Client sent `submitMove`.
    SubmitMove {
        connection: ConnectionId,
        mv: MoveSpec,
    },
    /// A grace timer elapsed for this session.
    Reap { session_id: SessionId },
    /// Read-only query: the public listing.
    SessionList {
        reply: oneshot::Sender<Vec<SessionSummary>>,
    },
    /// Read-only query: does this session exist right now?
    SessionExists {
        session_id: SessionId,
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle for sending commands to the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Sends a command, reporting [`CoordinatorError::Unavailable`] if the
    /// coordinator task has stopped.
    pub async fn send(&self, command: CoordinatorCommand) -> Result<(), CoordinatorError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| CoordinatorError::Unavailable)
    }

    pub async fn connect(
        &self,
        connection: ConnectionId,
        sender: EventSender,
    ) -> Result<(), CoordinatorError> {
        self.send(CoordinatorCommand::Connect { connection, sender })
            .await
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), CoordinatorError> {
        self.send(CoordinatorCommand::Disconnect { connection })
            .await
    }

    /// The public listing of playing sessions.
    pub async fn session_list(&self) -> Result<Vec<SessionSummary>, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::SessionList { reply }).await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }

    /// Whether a session currently exists, in any status.
    pub async fn session_exists(
        &self,
        session_id: SessionId,
    ) -> Result<bool, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(CoordinatorCommand::SessionExists { session_id, reply })
            .await?;
        rx.await.map_err(|_| CoordinatorError::Unavailable)
    }
}

/// Spawns the coordinator task and returns a handle to it.
///
/// The task runs until every handle is dropped.
pub fn spawn_coordinator<E: RulesEngine>(
    engine: E,
    config: CoordinatorConfig,
    channel_capacity: usize,
) -> CoordinatorHandle {
    let (tx, mut rx) = mpsc::channel(channel_capacity);
    let handle = CoordinatorHandle { sender: tx };
    let timer_handle = handle.clone();

    tokio::spawn(async move {
        let mut coordinator = Coordinator::new(engine, config);
        while let Some(command) = rx.recv().await {
            dispatch(&mut coordinator, command);
            for order in coordinator.take_reap_orders() {
                let handle = timer_handle.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(order.delay).await;
                    let _ = handle
                        .send(CoordinatorCommand::Reap {
                            session_id: order.session_id,
                        })
                        .await;
                });
            }
        }
        tracing::debug!("coordinator task stopped");
    });

    handle
}

fn dispatch<E: RulesEngine>(coordinator: &mut Coordinator<E>, command: CoordinatorCommand) {
    match command {
        CoordinatorCommand::Connect { connection, sender } => {
            coordinator.connect(connection, sender);
        }
        CoordinatorCommand::Disconnect { connection } => {
            coordinator.disconnect(connection);
        }
        CoordinatorCommand::RequestMatch { connection } => {
            coordinator.request_match(connection);
        }
        CoordinatorCommand::Join {
            connection,
            session_id,
            token,
        } => {
            coordinator.join(connection, session_id, token);
        }
        CoordinatorCommand::SubmitMove { connection, mv } => {
            coordinator.submit_move(connection, mv);
        }
        CoordinatorCommand::Reap { session_id } => {
            coordinator.reap(&session_id);
        }
        CoordinatorCommand::SessionList { reply } => {
            let _ = reply.send(coordinator.session_list());
        }
        CoordinatorCommand::SessionExists { session_id, reply } => {
            let _ = reply.send(coordinator.session_exists(&session_id));
        }
    }
}
