//! The coordinator service object.
//!
//! Owns the registry, the matchmaking slot, and the broadcast router, and
//! implements the whole event protocol against them: pairing, the join
//! protocol, the turn gate, and the session lifecycle. Every method runs
//! synchronously on borrowed state, which is what makes the state machine
//! testable without a runtime; the async actor in [`crate::actor`] is a thin
//! wrapper that serializes calls into it.

use std::time::Duration;

use skewer_engine::RulesEngine;
use skewer_protocol::{Color, MoveSpec, Role, SeatToken, ServerEvent, SessionId, SessionSummary};
use skewer_transport::ConnectionId;

use crate::config::CoordinatorConfig;
use crate::matchmaking::{MatchDecision, MatchSlot};
use crate::registry::SessionRegistry;
use crate::router::{BroadcastRouter, EventSender};

/// A deferred reclamation the caller must schedule.
///
/// The coordinator never sleeps; it queues these and the actor turns them
/// into timers that feed `reap` back in after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapOrder {
    pub session_id: SessionId,
    pub delay: Duration,
}

/// The session coordinator: one instance owns all matchmaking, session, and
/// routing state for the process.
pub struct Coordinator<E: RulesEngine> {
    engine: E,
    config: CoordinatorConfig,
    registry: SessionRegistry<E::Position>,
    slot: MatchSlot,
    router: BroadcastRouter,
    pending_reaps: Vec<ReapOrder>,
}

impl<E: RulesEngine> Coordinator<E> {
    pub fn new(engine: E, config: CoordinatorConfig) -> Self {
        Self {
            engine,
            config,
            registry: SessionRegistry::new(),
            slot: MatchSlot::new(),
            router: BroadcastRouter::new(),
            pending_reaps: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------------

    /// Registers a new connection's outbound event channel.
    pub fn connect(&mut self, connection: ConnectionId, sender: EventSender) {
        tracing::debug!(%connection, "connection registered");
        self.router.register(connection, sender);
    }

    /// Handles a connection going away: cancels any matchmaking wait,
    /// applies the disconnect lifecycle rules for its session, and
    /// unregisters its channel.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        if self.slot.cancel(connection) {
            tracing::debug!(%connection, "matchmaking wait cancelled");
        }
        self.router.unregister(connection);

        let Some(session_id) = self.registry.clear_membership(connection) else {
            return;
        };
        let Some((seat_color, playing)) = self
            .registry
            .get(&session_id)
            .map(|s| (s.seat_of(connection), s.status().is_playing()))
        else {
            return;
        };

        match seat_color {
            Some(color) => {
                // The binding is dropped so a stale connection never counts
                // as seated; the token keeps possession for a rejoin.
                if let Some(session) = self.registry.get_mut(&session_id) {
                    session.unbind_seat(color);
                    let (white, black) = session.roster();
                    let room = session.room_connections();
                    self.router
                        .to_each(room, &ServerEvent::RosterUpdated { white, black });
                }
                if playing {
                    // Forfeit: the remaining seat wins. The short grace gives
                    // the winner time to read the result.
                    let result = format!("{} wins by disconnect.", color.opposite());
                    let grace = self.config.forfeit_grace;
                    tracing::info!(%session_id, %connection, "seat disconnected mid-game");
                    self.end_session(&session_id, result, grace);
                }
            }
            None => {
                let Some(session) = self.registry.get_mut(&session_id) else {
                    return;
                };
                if session.remove_spectator(connection) {
                    let count = session.viewer_count();
                    let room = session.room_connections();
                    self.router
                        .to_each(room, &ServerEvent::ViewerCountChanged { count });
                    if playing {
                        self.broadcast_session_list();
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Matchmaking
    // -----------------------------------------------------------------------

    /// Handles a `requestMatch` from `connection`.
    pub fn request_match(&mut self, connection: ConnectionId) {
        let decision = self
            .slot
            .request(connection, |c| self.router.is_connected(c));

        match decision {
            MatchDecision::Waiting => {
                self.router
                    .to_connection(connection, ServerEvent::WaitingForOpponent);
            }
            MatchDecision::Paired { first, second } => {
                let session_id = self.registry.create(self.engine.initial());
                let Some(session) = self.registry.get(&session_id) else {
                    return;
                };
                // Queue order decides color: first in gets white.
                let white_token = session.seat(Color::White).token().clone();
                let black_token = session.seat(Color::Black).token().clone();
                tracing::info!(%session_id, %first, %second, "paired new session");

                self.router.to_connection(
                    first,
                    ServerEvent::MatchedSession {
                        session_id: session_id.clone(),
                        token: white_token,
                    },
                );
                self.router.to_connection(
                    second,
                    ServerEvent::MatchedSession {
                        session_id,
                        token: black_token,
                    },
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Join protocol
    // -----------------------------------------------------------------------

    /// Handles a `joinSession`: resolves the role from the presented token,
    /// binds or spectates, and brings the joiner up to date.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        session_id: SessionId,
        token: Option<SeatToken>,
    ) {
        if !self.registry.contains(&session_id) {
            self.router.to_connection(
                connection,
                ServerEvent::ProtocolError {
                    message: format!("session not found: {session_id}"),
                },
            );
            return;
        }
        self.leave_current(connection, &session_id);

        let Some(session) = self.registry.get_mut(&session_id) else {
            return;
        };
        let role = session.resolve_role(token.as_ref());
        match role {
            Role::White => {
                session.remove_spectator(connection);
                session.bind_seat(Color::White, connection);
            }
            Role::Black => {
                session.remove_spectator(connection);
                session.bind_seat(Color::Black, connection);
            }
            Role::Spectator => {
                session.add_spectator(connection);
            }
        }
        tracing::debug!(%session_id, %connection, ?role, "join resolved");

        let (white, black) = session.roster();
        let count = session.viewer_count();
        let snapshot = self.engine.serialize(session.position());
        let room = session.room_connections();
        let started = session.status().is_waiting()
            && session.both_seats_bound()
            && session.start();
        let playing = session.status().is_playing();

        self.registry.set_membership(connection, session_id.clone());

        self.router
            .to_connection(connection, ServerEvent::RoleAssigned { role });
        self.router
            .to_each(room.iter().copied(), &ServerEvent::RosterUpdated { white, black });
        self.router
            .to_each(room.iter().copied(), &ServerEvent::ViewerCountChanged { count });
        self.router
            .to_connection(connection, ServerEvent::PositionSnapshot { position: snapshot });

        if started {
            tracing::info!(%session_id, "both seats bound; game started");
            self.router
                .to_each(room.iter().copied(), &ServerEvent::GameStarted);
            self.broadcast_session_list();
        } else if role == Role::Spectator && playing {
            // The listing shows viewer counts, so a new viewer refreshes it.
            self.broadcast_session_list();
        }
    }

    /// Detaches `connection` from whatever session it was in before joining
    /// `next`. A spectator leaves the old room; a seat holder gives up the
    /// binding (the token keeps possession), and walking out on a live game
    /// forfeits it.
    fn leave_current(&mut self, connection: ConnectionId, next: &SessionId) {
        let Some(old_id) = self.registry.clear_membership(connection) else {
            return;
        };
        if old_id == *next {
            return;
        }
        let Some(session) = self.registry.get_mut(&old_id) else {
            return;
        };
        if let Some(color) = session.seat_of(connection) {
            session.unbind_seat(color);
            let (white, black) = session.roster();
            let room = session.room_connections();
            let playing = session.status().is_playing();
            self.router
                .to_each(room, &ServerEvent::RosterUpdated { white, black });
            if playing {
                let result = format!("{} wins by disconnect.", color.opposite());
                let grace = self.config.forfeit_grace;
                tracing::info!(%old_id, %connection, "seat abandoned mid-game");
                self.end_session(&old_id, result, grace);
            }
        } else if session.remove_spectator(connection) {
            let count = session.viewer_count();
            let room = session.room_connections();
            let playing = session.status().is_playing();
            self.router
                .to_each(room, &ServerEvent::ViewerCountChanged { count });
            if playing {
                self.broadcast_session_list();
            }
        }
    }

    // -----------------------------------------------------------------------
    // Turn & move gate
    // -----------------------------------------------------------------------

    /// Handles a `submitMove`.
    ///
    /// Moves from connections with no session, from a session not in playing
    /// status, or from anyone but the side-to-move's bound seat are dropped
    /// without a reply. Engine rejections go back to the submitter as
    /// `invalidMove`; a legal move broadcasts `moveApplied` then
    /// `positionSnapshot` to the whole room.
    pub fn submit_move(&mut self, connection: ConnectionId, mv: MoveSpec) {
        let Some(session_id) = self.registry.membership(connection).cloned() else {
            tracing::debug!(%connection, "move from connection outside any session");
            return;
        };
        let Some(session) = self.registry.get_mut(&session_id) else {
            return;
        };
        if !session.status().is_playing() {
            tracing::debug!(%session_id, %connection, "move outside playing status");
            return;
        }
        let turn = self.engine.side_to_move(session.position());
        if session.seat(turn).connection() != Some(connection) {
            tracing::debug!(%session_id, %connection, "move from non-turn connection");
            return;
        }

        match self.engine.apply_move(session.position(), &mv) {
            Err(reason) => {
                self.router.to_connection(
                    connection,
                    ServerEvent::InvalidMove {
                        move_spec: mv,
                        reason: reason.to_string(),
                    },
                );
            }
            Ok(next) => {
                let terminal = self.engine.terminal_status(&next);
                let snapshot = self.engine.serialize(&next);
                session.set_position(next);
                let room = session.room_connections();

                self.router
                    .to_each(room.iter().copied(), &ServerEvent::MoveApplied(mv));
                self.router.to_each(
                    room.iter().copied(),
                    &ServerEvent::PositionSnapshot { position: snapshot },
                );

                if let Some(result) = terminal.summary() {
                    let grace = self.config.game_over_grace;
                    self.end_session(&session_id, result, grace);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Playing -> ended: records the result, tells the room, queues the
    /// reclamation, and refreshes the public listing.
    fn end_session(&mut self, session_id: &SessionId, result: String, grace: Duration) {
        let Some(session) = self.registry.get_mut(session_id) else {
            return;
        };
        if !session.end(result.clone()) {
            return;
        }
        let room = session.room_connections();
        tracing::info!(%session_id, %result, "session ended");

        self.router
            .to_each(room, &ServerEvent::GameEnded { result });
        self.pending_reaps.push(ReapOrder {
            session_id: session_id.clone(),
            delay: grace,
        });
        self.broadcast_session_list();
    }

    /// Executes a due reclamation. Re-validates first: the timer may fire
    /// after the session was already removed, and only ended sessions are
    /// ever reclaimed.
    pub fn reap(&mut self, session_id: &SessionId) {
        let ended = self
            .registry
            .get(session_id)
            .is_some_and(|s| s.status().is_ended());
        if !ended {
            tracing::debug!(%session_id, "reap skipped; session absent or not ended");
            return;
        }
        self.registry.remove(session_id);
        tracing::info!(%session_id, "session reclaimed");
        self.broadcast_session_list();
    }

    /// Drains the reclamations queued since the last call. The caller owns
    /// scheduling; see [`ReapOrder`].
    pub fn take_reap_orders(&mut self) -> Vec<ReapOrder> {
        std::mem::take(&mut self.pending_reaps)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The public listing: every session currently in playing status.
    pub fn session_list(&self) -> Vec<SessionSummary> {
        self.registry.playing_summaries()
    }

    /// Whether `session_id` currently exists in the registry, in any status.
    pub fn session_exists(&self, session_id: &SessionId) -> bool {
        self.registry.contains(session_id)
    }

    fn broadcast_session_list(&self) {
        let sessions = self.registry.playing_summaries();
        self.router
            .to_all(&ServerEvent::SessionListUpdated { sessions });
    }
}

// =========================================================================
// Tests
// =========================================================================
