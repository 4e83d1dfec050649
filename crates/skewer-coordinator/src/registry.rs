//! Session registry: the authoritative record of every live session.
//!
//! A [`Session`] owns the game position, both seats with their possession
//! tokens, the spectator set, and the lifecycle status. The [`SessionRegistry`]
//! maps session ids to sessions and tracks which session each connection is
//! currently inside.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use skewer_protocol::{Color, Role, SeatToken, SessionId, SessionSummary};
use skewer_transport::ConnectionId;

/// Bytes of entropy in a session id (16 hex chars on the wire).
const SESSION_ID_BYTES: usize = 8;
/// Bytes of entropy in a possession token (32 hex chars on the wire).
const SEAT_TOKEN_BYTES: usize = 16;

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::rng();
    (0..bytes).map(|_| format!("{:02x}", rng.random::<u8>())).collect()
}

/// Mints a fresh public session identifier.
pub fn generate_session_id() -> SessionId {
    SessionId::new(random_hex(SESSION_ID_BYTES))
}

/// Mints a fresh possession token. Long enough that guessing one is not a
/// practical attack on a seat.
pub fn generate_seat_token() -> SeatToken {
    SeatToken::new(random_hex(SEAT_TOKEN_BYTES))
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// One side of the board.
///
/// The token is fixed at session creation; the connection is rebound on every
/// successful token-bearing join, which is what survives reconnects.
#[derive(Debug)]
pub struct Seat {
    connection: Option<ConnectionId>,
    display_name: String,
    token: SeatToken,
}

impl Seat {
    fn new(display_name: impl Into<String>, token: SeatToken) -> Self {
        Self {
            connection: None,
            display_name: display_name.into(),
            token,
        }
    }

    /// The connection currently bound to this seat, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// The seat's display name ("Player 1" / "Player 2").
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The seat's possession token. Delivered once, to the paired
    /// connection; never broadcast.
    pub fn token(&self) -> &SeatToken {
        &self.token
    }

    /// Whether `token` proves the right to occupy this seat.
    pub fn matches(&self, token: &SeatToken) -> bool {
        &self.token == token
    }

    /// Whether a connection currently holds this seat.
    pub fn is_bound(&self) -> bool {
        self.connection.is_some()
    }
}

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Lifecycle status of a session. Transitions are one-way:
/// waiting -> playing -> ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created at pairing; at least one seat still unbound.
    Waiting,
    /// Both seats bound; moves are accepted.
    Playing,
    /// Terminal state reached; awaiting reclamation.
    Ended,
}

impl SessionStatus {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single game session: position, seats, spectators, lifecycle.
#[derive(Debug)]
pub struct Session<P> {
    id: SessionId,
    position: P,
    white: Seat,
    black: Seat,
    spectators: HashSet<ConnectionId>,
    status: SessionStatus,
    result: Option<String>,
}

impl<P> Session<P> {
    fn new(id: SessionId, position: P) -> Self {
        Self {
            id,
            position,
            white: Seat::new("Player 1", generate_seat_token()),
            black: Seat::new("Player 2", generate_seat_token()),
            spectators: HashSet::new(),
            status: SessionStatus::Waiting,
            result: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn set_position(&mut self, position: P) {
        self.position = position;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The result summary, present once the session has ended.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn seat(&self, color: Color) -> &Seat {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Resolves a presented token to a role. Anything that matches neither
    /// seat token, including no token at all, is a spectator.
    pub fn resolve_role(&self, token: Option<&SeatToken>) -> Role {
        match token {
            Some(t) if self.white.matches(t) => Role::White,
            Some(t) if self.black.matches(t) => Role::Black,
            _ => Role::Spectator,
        }
    }

    /// Binds `connection` to the given seat, replacing any previous binding.
    pub fn bind_seat(&mut self, color: Color, connection: ConnectionId) {
        let seat = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        seat.connection = Some(connection);
    }

    /// Clears the seat binding for `color`. The token keeps possession, so
    /// the holder can rebind on a later token-bearing join.
    pub fn unbind_seat(&mut self, color: Color) {
        let seat = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        seat.connection = None;
    }

    /// The color whose seat `connection` currently holds, if any.
    pub fn seat_of(&self, connection: ConnectionId) -> Option<Color> {
        if self.white.connection == Some(connection) {
            Some(Color::White)
        } else if self.black.connection == Some(connection) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn both_seats_bound(&self) -> bool {
        self.white.is_bound() && self.black.is_bound()
    }

    /// Adds a spectator. Returns `true` if the set changed.
    pub fn add_spectator(&mut self, connection: ConnectionId) -> bool {
        self.spectators.insert(connection)
    }

    /// Removes a spectator. Returns `true` if the set changed.
    pub fn remove_spectator(&mut self, connection: ConnectionId) -> bool {
        self.spectators.remove(&connection)
    }

    pub fn is_spectator(&self, connection: ConnectionId) -> bool {
        self.spectators.contains(&connection)
    }

    pub fn viewer_count(&self) -> usize {
        self.spectators.len()
    }

    /// Every connection in the session's room: bound seats plus spectators.
    pub fn room_connections(&self) -> Vec<ConnectionId> {
        let mut conns: Vec<ConnectionId> = Vec::with_capacity(self.spectators.len() + 2);
        conns.extend(self.white.connection);
        conns.extend(self.black.connection);
        conns.extend(self.spectators.iter().copied());
        conns
    }

    /// Display names of bound seats, `None` for an unbound seat.
    pub fn roster(&self) -> (Option<String>, Option<String>) {
        let name = |seat: &Seat| seat.is_bound().then(|| seat.display_name.clone());
        (name(&self.white), name(&self.black))
    }

    /// Waiting -> playing. Returns `true` if the transition happened.
    pub fn start(&mut self) -> bool {
        if self.status.is_waiting() {
            self.status = SessionStatus::Playing;
            true
        } else {
            false
        }
    }

    /// Playing -> ended, recording the result summary. Returns `true` if the
    /// transition happened; an already-ended session keeps its first result.
    pub fn end(&mut self, result: impl Into<String>) -> bool {
        if self.status.is_playing() {
            self.status = SessionStatus::Ended;
            self.result = Some(result.into());
            true
        } else {
            false
        }
    }

    /// The public listing entry for this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            white: self.white.display_name.clone(),
            black: self.black.display_name.clone(),
            viewer_count: self.viewer_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns every live session and the connection -> session membership table.
///
/// A connection is inside at most one session at a time; joining a new one
/// replaces the old membership.
#[derive(Debug, Default)]
pub struct SessionRegistry<P> {
    sessions: HashMap<SessionId, Session<P>>,
    memberships: HashMap<ConnectionId, SessionId>,
}

impl<P> SessionRegistry<P> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Creates a session in waiting status around `position` and returns its
    /// id. Seat tokens are minted here and never change afterwards.
    pub fn create(&mut self, position: P) -> SessionId {
        let id = generate_session_id();
        let session = Session::new(id.clone(), position);
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session<P>> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session<P>> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Removes a session and every membership entry pointing at it.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session<P>> {
        let session = self.sessions.remove(id)?;
        self.memberships.retain(|_, sid| sid != id);
        Some(session)
    }

    /// The session `connection` is currently inside, if any.
    pub fn membership(&self, connection: ConnectionId) -> Option<&SessionId> {
        self.memberships.get(&connection)
    }

    pub fn set_membership(&mut self, connection: ConnectionId, id: SessionId) {
        self.memberships.insert(connection, id);
    }

    /// Clears a connection's membership, returning the session it was in.
    pub fn clear_membership(&mut self, connection: ConnectionId) -> Option<SessionId> {
        self.memberships.remove(&connection)
    }

    /// Listing entries for every session in playing status.
    pub fn playing_summaries(&self) -> Vec<SessionSummary> {
        self.sessions
            .values()
            .filter(|s| s.status().is_playing())
            .map(Session::summary)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
