//! End-to-end coordinator flows, driven through the synchronous
//! [`Coordinator`] with a scripted rules engine observing every event each
//! connection would have received.

use skewer_coordinator::{Coordinator, CoordinatorConfig};
use skewer_engine::{ChessRules, EngineError, RulesEngine, TerminalStatus};
use skewer_protocol::{Color, MoveSpec, Role, SeatToken, ServerEvent, SessionId};
use skewer_transport::ConnectionId;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// ---------------------------------------------------------------------------
// Scripted engine
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct ScriptPosition {
    applied: Vec<String>,
    side: Color,
}

/// Accepts any move except one from the square "bad"; optionally declares
/// checkmate once a move count is reached.
struct ScriptEngine {
    mate_after: Option<usize>,
}

impl ScriptEngine {
    fn lenient() -> Self {
        Self { mate_after: None }
    }
}

impl RulesEngine for ScriptEngine {
    type Position = ScriptPosition;

    fn initial(&self) -> ScriptPosition {
        ScriptPosition {
            applied: Vec::new(),
            side: Color::White,
        }
    }

    fn apply_move(
        &self,
        position: &ScriptPosition,
        mv: &MoveSpec,
    ) -> Result<ScriptPosition, EngineError> {
        if mv.from == "bad" {
            return Err(EngineError::IllegalMove);
        }
        let mut applied = position.applied.clone();
        applied.push(format!("{}{}", mv.from, mv.to));
        Ok(ScriptPosition {
            applied,
            side: position.side.opposite(),
        })
    }

    fn side_to_move(&self, position: &ScriptPosition) -> Color {
        position.side
    }

    fn terminal_status(&self, position: &ScriptPosition) -> TerminalStatus {
        match self.mate_after {
            Some(n) if position.applied.len() >= n => TerminalStatus::Checkmate {
                winner: position.side.opposite(),
            },
            _ => TerminalStatus::Ongoing,
        }
    }

    fn serialize(&self, position: &ScriptPosition) -> String {
        if position.applied.is_empty() {
            "start".to_string()
        } else {
            position.applied.join(" ")
        }
    }

    fn deserialize(&self, encoded: &str) -> Result<ScriptPosition, EngineError> {
        if encoded == "start" {
            Ok(self.initial())
        } else {
            Err(EngineError::BadPosition(encoded.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Harness helpers
// ---------------------------------------------------------------------------

type Rx = UnboundedReceiver<ServerEvent>;

fn conn(n: u64) -> ConnectionId {
    ConnectionId::new(n)
}

fn attach<E: RulesEngine>(coordinator: &mut Coordinator<E>, n: u64) -> Rx {
    let (tx, rx) = mpsc::unbounded_channel();
    coordinator.connect(conn(n), tx);
    rx
}

fn drain(rx: &mut Rx) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn expect_matched(rx: &mut Rx) -> (SessionId, SeatToken) {
    for event in drain(rx) {
        if let ServerEvent::MatchedSession { session_id, token } = event {
            return (session_id, token);
        }
    }
    panic!("expected a matchedSession event");
}

fn mv(from: &str, to: &str) -> MoveSpec {
    MoveSpec {
        from: from.into(),
        to: to.into(),
        promotion: None,
    }
}

fn lenient_coordinator() -> Coordinator<ScriptEngine> {
    Coordinator::new(ScriptEngine::lenient(), CoordinatorConfig::default())
}

/// Pairs conn(1) and conn(2) and returns the session id and both tokens.
fn pair(coordinator: &mut Coordinator<ScriptEngine>, rx1: &mut Rx, rx2: &mut Rx)
-> (SessionId, SeatToken, SeatToken) {
    coordinator.request_match(conn(1));
    coordinator.request_match(conn(2));
    let (id1, white_token) = expect_matched(rx1);
    let (id2, black_token) = expect_matched(rx2);
    assert_eq!(id1, id2, "both players must land in the same session");
    (id1, white_token, black_token)
}

/// Pairs and joins conn(1) as white and conn(2) as black, draining both
/// receivers, so the session is in playing status.
fn started(coordinator: &mut Coordinator<ScriptEngine>, rx1: &mut Rx, rx2: &mut Rx) -> SessionId {
    let (id, white_token, black_token) = pair(coordinator, rx1, rx2);
    coordinator.join(conn(1), id.clone(), Some(white_token));
    coordinator.join(conn(2), id.clone(), Some(black_token));
    drain(rx1);
    drain(rx2);
    id
}

// ---------------------------------------------------------------------------
// Matchmaking
// ---------------------------------------------------------------------------

#[test]
fn test_first_requester_is_told_to_wait() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);

    coordinator.request_match(conn(1));
    assert_eq!(drain(&mut rx1), vec![ServerEvent::WaitingForOpponent]);
}

#[test]
fn test_repeat_request_never_pairs_with_itself() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);

    coordinator.request_match(conn(1));
    coordinator.request_match(conn(1));

    let events = drain(&mut rx1);
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| *e == ServerEvent::WaitingForOpponent));
}

#[test]
fn test_pairing_gives_each_player_a_distinct_token() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);

    let (_, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);
    assert_ne!(white_token, black_token);
}

#[test]
fn test_first_requester_gets_the_white_seat() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);

    let (id, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.join(conn(1), id.clone(), Some(white_token));
    let events = drain(&mut rx1);
    assert!(
        events.contains(&ServerEvent::RoleAssigned { role: Role::White }),
        "first requester should be white, got {events:?}"
    );

    coordinator.join(conn(2), id, Some(black_token));
    let events = drain(&mut rx2);
    assert!(events.contains(&ServerEvent::RoleAssigned { role: Role::Black }));
}

#[test]
fn test_stale_waiter_is_replaced_not_paired() {
    let mut coordinator = lenient_coordinator();
    let rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);

    coordinator.request_match(conn(1));
    // conn(1)'s receiver goes away without a disconnect being processed yet.
    drop(rx1);
    coordinator.request_match(conn(2));

    assert_eq!(
        drain(&mut rx2),
        vec![ServerEvent::WaitingForOpponent],
        "requester should replace the dead waiter, not pair with it"
    );
}

#[test]
fn test_disconnect_clears_the_matchmaking_slot() {
    let mut coordinator = lenient_coordinator();
    let _rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);

    coordinator.request_match(conn(1));
    coordinator.disconnect(conn(1));
    coordinator.request_match(conn(2));

    assert_eq!(drain(&mut rx2), vec![ServerEvent::WaitingForOpponent]);
}

// ---------------------------------------------------------------------------
// Join protocol
// ---------------------------------------------------------------------------

#[test]
fn test_join_unknown_session_gets_protocol_error() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);

    coordinator.join(conn(1), SessionId::new("0123456789abcdef"), None);

    let events = drain(&mut rx1);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ServerEvent::ProtocolError { .. }));
}

#[test]
fn test_joiner_receives_role_then_snapshot() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, _) = pair(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.join(conn(1), id, Some(white_token));

    let events = drain(&mut rx1);
    let role_at = events
        .iter()
        .position(|e| matches!(e, ServerEvent::RoleAssigned { .. }))
        .expect("roleAssigned");
    let snapshot_at = events
        .iter()
        .position(|e| matches!(e, ServerEvent::PositionSnapshot { .. }))
        .expect("positionSnapshot");
    assert!(role_at < snapshot_at);
    assert!(events.contains(&ServerEvent::PositionSnapshot {
        position: "start".into()
    }));
}

#[test]
fn test_unknown_token_joins_as_spectator() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, _, _) = pair(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    coordinator.join(conn(3), id.clone(), Some(SeatToken::new("not-a-real-token")));
    let events = drain(&mut rx3);
    assert!(events.contains(&ServerEvent::RoleAssigned {
        role: Role::Spectator
    }));
    assert!(events.contains(&ServerEvent::ViewerCountChanged { count: 1 }));

    let mut rx4 = attach(&mut coordinator, 4);
    coordinator.join(conn(4), id, None);
    let events = drain(&mut rx4);
    assert!(events.contains(&ServerEvent::RoleAssigned {
        role: Role::Spectator
    }));
    assert!(events.contains(&ServerEvent::ViewerCountChanged { count: 2 }));
}

#[test]
fn test_token_restores_seat_on_a_new_connection() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);
    coordinator.join(conn(1), id.clone(), Some(white_token.clone()));
    coordinator.join(conn(2), id.clone(), Some(black_token));
    drain(&mut rx1);
    drain(&mut rx2);

    // The same token arrives from a brand-new connection id, as after a
    // page reload that beat the disconnect handling.
    let mut rx9 = attach(&mut coordinator, 9);
    coordinator.join(conn(9), id, Some(white_token));

    let events = drain(&mut rx9);
    assert!(events.contains(&ServerEvent::RoleAssigned { role: Role::White }));

    // The rebound connection moves for white; the stale one cannot.
    drain(&mut rx2);
    coordinator.submit_move(conn(1), mv("e2", "e4"));
    assert!(drain(&mut rx2).is_empty(), "stale connection lost the seat");
    coordinator.submit_move(conn(9), mv("e2", "e4"));
    assert!(drain(&mut rx2).contains(&ServerEvent::MoveApplied(mv("e2", "e4"))));
}

#[test]
fn test_game_starts_when_both_seats_bound() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.join(conn(1), id.clone(), Some(white_token));
    assert!(
        !drain(&mut rx1).contains(&ServerEvent::GameStarted),
        "one bound seat must not start the game"
    );

    coordinator.join(conn(2), id.clone(), Some(black_token));
    let events1 = drain(&mut rx1);
    let events2 = drain(&mut rx2);
    assert!(events1.contains(&ServerEvent::GameStarted));
    assert!(events2.contains(&ServerEvent::GameStarted));

    // Both players also see the listing refresh naming their session.
    for events in [&events1, &events2] {
        let listed = events.iter().any(|e| match e {
            ServerEvent::SessionListUpdated { sessions } => {
                sessions.len() == 1 && sessions[0].id == id
            }
            _ => false,
        });
        assert!(listed, "expected sessionListUpdated, got {events:?}");
    }
}

#[test]
fn test_black_joining_after_white_dropped_does_not_start_the_game() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.join(conn(1), id.clone(), Some(white_token.clone()));
    coordinator.disconnect(conn(1));

    // White's seat binding is gone, so black arriving must not start a game
    // against a dead connection.
    coordinator.join(conn(2), id.clone(), Some(black_token));
    let events = drain(&mut rx2);
    assert!(
        !events.contains(&ServerEvent::GameStarted),
        "no game against an unbound seat, got {events:?}"
    );
    assert!(events.contains(&ServerEvent::RosterUpdated {
        white: None,
        black: Some("Player 2".into()),
    }));

    // The token reclaims the seat from a fresh connection; only then do both
    // seats count as bound and the game starts.
    let mut rx9 = attach(&mut coordinator, 9);
    coordinator.join(conn(9), id, Some(white_token));
    assert!(drain(&mut rx9).contains(&ServerEvent::GameStarted));
    assert!(drain(&mut rx2).contains(&ServerEvent::GameStarted));
}

#[test]
fn test_rejoining_a_started_session_does_not_restart_it() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, black_token) = pair(&mut coordinator, &mut rx1, &mut rx2);
    coordinator.join(conn(1), id.clone(), Some(white_token.clone()));
    coordinator.join(conn(2), id.clone(), Some(black_token));
    drain(&mut rx1);
    drain(&mut rx2);

    coordinator.join(conn(1), id, Some(white_token));

    assert!(!drain(&mut rx1).contains(&ServerEvent::GameStarted));
    assert!(!drain(&mut rx2).contains(&ServerEvent::GameStarted));
}

#[test]
fn test_spectator_leaving_for_another_session_updates_old_room() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id_a = started(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    let mut rx4 = attach(&mut coordinator, 4);
    coordinator.request_match(conn(3));
    coordinator.request_match(conn(4));
    let (id_b, _) = expect_matched(&mut rx3);
    drain(&mut rx4);

    let mut rx5 = attach(&mut coordinator, 5);
    coordinator.join(conn(5), id_a, None);
    drain(&mut rx1);
    drain(&mut rx5);

    coordinator.join(conn(5), id_b, None);

    assert!(
        drain(&mut rx1).contains(&ServerEvent::ViewerCountChanged { count: 0 }),
        "old room should see the spectator leave"
    );
}

// ---------------------------------------------------------------------------
// Turn & move gate
// ---------------------------------------------------------------------------

#[test]
fn test_legal_move_broadcasts_applied_then_snapshot_to_whole_room() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    coordinator.join(conn(3), id, None);
    drain(&mut rx1);
    drain(&mut rx2);
    drain(&mut rx3);

    coordinator.submit_move(conn(1), mv("e2", "e4"));

    for (who, rx) in [("white", &mut rx1), ("black", &mut rx2), ("spectator", &mut rx3)] {
        let events = drain(rx);
        assert_eq!(
            events,
            vec![
                ServerEvent::MoveApplied(mv("e2", "e4")),
                ServerEvent::PositionSnapshot {
                    position: "e2e4".into()
                },
            ],
            "{who} should see exactly moveApplied then positionSnapshot"
        );
    }
}

#[test]
fn test_rejected_move_notifies_only_the_submitter() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    started(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.submit_move(conn(1), mv("bad", "e4"));

    let events = drain(&mut rx1);
    assert_eq!(
        events,
        vec![ServerEvent::InvalidMove {
            move_spec: mv("bad", "e4"),
            reason: "illegal move".into(),
        }]
    );
    assert!(drain(&mut rx2).is_empty(), "room must not hear about it");

    // Position is untouched: white is still to move and can play on.
    coordinator.submit_move(conn(1), mv("e2", "e4"));
    assert!(drain(&mut rx2)
        .contains(&ServerEvent::MoveApplied(mv("e2", "e4"))));
}

#[test]
fn test_move_out_of_turn_is_dropped_silently() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    started(&mut coordinator, &mut rx1, &mut rx2);

    // Black tries to move first.
    coordinator.submit_move(conn(2), mv("e7", "e5"));

    assert!(drain(&mut rx1).is_empty());
    assert!(drain(&mut rx2).is_empty(), "no confirmation, no rejection");
}

#[test]
fn test_spectator_move_is_dropped_silently() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    coordinator.join(conn(3), id, None);
    drain(&mut rx1);
    drain(&mut rx2);
    drain(&mut rx3);

    coordinator.submit_move(conn(3), mv("e2", "e4"));

    assert!(drain(&mut rx1).is_empty());
    assert!(drain(&mut rx3).is_empty());
}

#[test]
fn test_move_before_game_started_is_dropped() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, _) = pair(&mut coordinator, &mut rx1, &mut rx2);
    coordinator.join(conn(1), id, Some(white_token));
    drain(&mut rx1);

    coordinator.submit_move(conn(1), mv("e2", "e4"));

    assert!(drain(&mut rx1).is_empty(), "waiting sessions accept no moves");
}

#[test]
fn test_move_from_connection_outside_any_session_is_dropped() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);

    coordinator.submit_move(conn(1), mv("e2", "e4"));
    assert!(drain(&mut rx1).is_empty());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_checkmate_ends_the_session_exactly_once() {
    let mut coordinator = Coordinator::new(
        ScriptEngine { mate_after: Some(1) },
        CoordinatorConfig::default(),
    );
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.submit_move(conn(1), mv("d8", "h4"));

    for rx in [&mut rx1, &mut rx2] {
        let events = drain(rx);
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, ServerEvent::GameEnded { .. }))
            .collect();
        assert_eq!(
            ended,
            vec![&ServerEvent::GameEnded {
                result: "Checkmate! White wins.".into()
            }]
        );
    }

    // Ended sessions leave the public listing immediately but stay in the
    // registry until reaped.
    assert!(coordinator.session_list().is_empty());
    assert!(coordinator.session_exists(&id));

    coordinator.reap(&id);
    assert!(!coordinator.session_exists(&id));
}

#[test]
fn test_no_moves_accepted_after_game_end() {
    let mut coordinator = Coordinator::new(
        ScriptEngine { mate_after: Some(1) },
        CoordinatorConfig::default(),
    );
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    started(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.submit_move(conn(1), mv("d8", "h4"));
    drain(&mut rx1);
    drain(&mut rx2);

    coordinator.submit_move(conn(2), mv("e7", "e5"));
    assert!(drain(&mut rx1).is_empty());
    assert!(drain(&mut rx2).is_empty());
}

#[test]
fn test_seat_disconnect_mid_game_forfeits_to_the_other_seat() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    coordinator.join(conn(3), id, None);
    drain(&mut rx1);
    drain(&mut rx3);

    // Black drops.
    coordinator.disconnect(conn(2));

    for rx in [&mut rx1, &mut rx3] {
        let events = drain(rx);
        let ended_at = events
            .iter()
            .position(|e| {
                *e == ServerEvent::GameEnded {
                    result: "White wins by disconnect.".into(),
                }
            })
            .expect("gameEnded with forfeit result");
        let listed_at = events
            .iter()
            .position(|e| matches!(e, ServerEvent::SessionListUpdated { .. }))
            .expect("sessionListUpdated after the forfeit");
        assert!(ended_at < listed_at);
    }
}

#[test]
fn test_seating_elsewhere_forfeits_the_abandoned_game() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id_a = started(&mut coordinator, &mut rx1, &mut rx2);

    // White queues up again and gets paired into a second session.
    let mut rx3 = attach(&mut coordinator, 3);
    coordinator.request_match(conn(3));
    coordinator.request_match(conn(1));
    let (id_b, _) = expect_matched(&mut rx3);
    let (_, token_b) = expect_matched(&mut rx1);
    assert_ne!(id_a, id_b);

    // Taking the new seat walks out on the live game: black wins it.
    coordinator.join(conn(1), id_b, Some(token_b));

    let events = drain(&mut rx2);
    assert!(events.contains(&ServerEvent::RosterUpdated {
        white: None,
        black: Some("Player 2".into()),
    }));
    assert!(events.contains(&ServerEvent::GameEnded {
        result: "Black wins by disconnect.".into(),
    }));
    assert!(coordinator.session_list().is_empty(), "forfeited game is delisted");

    let orders = coordinator.take_reap_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].session_id, id_a);
    assert_eq!(orders[0].delay, CoordinatorConfig::default().forfeit_grace);
}

#[test]
fn test_disconnect_while_waiting_does_not_forfeit() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let (id, white_token, _) = pair(&mut coordinator, &mut rx1, &mut rx2);
    coordinator.join(conn(1), id.clone(), Some(white_token));
    drain(&mut rx1);

    coordinator.disconnect(conn(1));

    assert!(
        coordinator.session_exists(&id),
        "waiting session should survive a seat disconnect"
    );
    assert!(!drain(&mut rx2)
        .iter()
        .any(|e| matches!(e, ServerEvent::GameEnded { .. })));
    assert!(coordinator.take_reap_orders().is_empty());
}

#[test]
fn test_spectator_disconnect_updates_viewer_count() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    let mut rx3 = attach(&mut coordinator, 3);
    let mut rx4 = attach(&mut coordinator, 4);
    coordinator.join(conn(3), id.clone(), None);
    coordinator.join(conn(4), id, None);
    drain(&mut rx1);
    drain(&mut rx2);
    drain(&mut rx3);
    drain(&mut rx4);

    coordinator.disconnect(conn(3));

    assert!(drain(&mut rx1).contains(&ServerEvent::ViewerCountChanged { count: 1 }));
    assert!(drain(&mut rx4).contains(&ServerEvent::ViewerCountChanged { count: 1 }));
    assert!(
        !drain(&mut rx2)
            .iter()
            .any(|e| matches!(e, ServerEvent::GameEnded { .. })),
        "spectator loss never ends the game"
    );
}

#[test]
fn test_viewer_count_changes_refresh_the_public_listing() {
    let mut coordinator = lenient_coordinator();
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    let id = started(&mut coordinator, &mut rx1, &mut rx2);

    // A connection in no session only hears listing refreshes.
    let mut rx7 = attach(&mut coordinator, 7);

    let listed_count = |events: &[ServerEvent]| {
        events.iter().find_map(|e| match e {
            ServerEvent::SessionListUpdated { sessions } => {
                Some(sessions[0].viewer_count)
            }
            _ => None,
        })
    };

    let _rx3 = attach(&mut coordinator, 3);
    coordinator.join(conn(3), id, None);
    assert_eq!(
        listed_count(&drain(&mut rx7)),
        Some(1),
        "a new viewer should refresh the listing"
    );

    coordinator.disconnect(conn(3));
    assert_eq!(
        listed_count(&drain(&mut rx7)),
        Some(0),
        "a lost viewer should refresh the listing"
    );
}

// ---------------------------------------------------------------------------
// With the real rules engine
// ---------------------------------------------------------------------------

/// Pairs and starts a session on the real chess engine.
fn started_chess(
    coordinator: &mut Coordinator<ChessRules>,
    rx1: &mut Rx,
    rx2: &mut Rx,
) -> SessionId {
    coordinator.request_match(conn(1));
    coordinator.request_match(conn(2));
    let (id, white_token) = expect_matched(rx1);
    let (_, black_token) = expect_matched(rx2);
    coordinator.join(conn(1), id.clone(), Some(white_token));
    coordinator.join(conn(2), id.clone(), Some(black_token));
    drain(rx1);
    drain(rx2);
    id
}

#[test]
fn test_chess_opening_move_flips_side_to_move() {
    let mut coordinator = Coordinator::new(ChessRules, CoordinatorConfig::default());
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    started_chess(&mut coordinator, &mut rx1, &mut rx2);

    coordinator.submit_move(conn(1), mv("e2", "e4"));

    let events = drain(&mut rx2);
    assert!(events.contains(&ServerEvent::MoveApplied(mv("e2", "e4"))));
    let snapshot = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::PositionSnapshot { position } => Some(position.clone()),
            _ => None,
        })
        .expect("positionSnapshot");
    assert!(
        snapshot.contains(" b "),
        "after 1. e4 it is black to move, got {snapshot}"
    );
}

#[test]
fn test_chess_illegal_move_is_rejected_with_reason() {
    let mut coordinator = Coordinator::new(ChessRules, CoordinatorConfig::default());
    let mut rx1 = attach(&mut coordinator, 1);
    let mut rx2 = attach(&mut coordinator, 2);
    started_chess(&mut coordinator, &mut rx1, &mut rx2);

    // Pawns cannot jump three squares.
    coordinator.submit_move(conn(1), mv("e2", "e5"));

    let events = drain(&mut rx1);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        ServerEvent::InvalidMove { move_spec, .. } if *move_spec == mv("e2", "e5")
    ));
}
