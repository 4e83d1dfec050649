//! Core protocol types for Skewer's wire format.
//!
//! Everything here travels between a browser client and the coordinator as
//! JSON over a persistent connection. The two top-level enums are
//! [`ClientEvent`] (what clients may send) and [`ServerEvent`] (what the
//! server emits, either to one connection or fanned out to a whole room).

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a game session.
///
/// Opaque, generated at session creation, immutable for the session's whole
/// lifetime. It doubles as the broadcast room key and as the game-page URL
/// path parameter, so it is public — unlike a [`SeatToken`].
///
/// `#[serde(transparent)]` makes it serialize as the plain inner string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an already-minted identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A possession token: the opaque secret minted once per seat at session
/// creation.
///
/// Presenting the matching token in `joinSession` proves the right to occupy
/// that seat, independent of connection identifier — which is what makes
/// reconnection after a network drop work. Tokens are delivered only to the
/// paired connection and must never be broadcast to the room, so this type
/// deliberately has no `Display` impl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatToken(String);

impl SeatToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// The two seat colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other color.
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

/// Capitalized for result summaries ("Checkmate! White wins.").
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "White"),
            Self::Black => write!(f, "Black"),
        }
    }
}

/// The role a connection receives from the join protocol.
///
/// A correct possession token yields a seat; anything else — including no
/// token at all — yields `Spectator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    White,
    Black,
    Spectator,
}

/// The piece a pawn promotes to. Wire format is the single-letter SAN
/// abbreviation, matching what board UIs produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

/// A complete move submission: origin and destination squares in algebraic
/// notation ("e2", "e4"), plus the promotion piece when the move promotes.
///
/// The coordinator never receives a partial promotion — the client UI is
/// responsible for collecting the piece choice before submitting, so the
/// turn gate only ever sees finished moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSpec {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionPiece>,
}

/// One entry in the public listing of sessions in `playing` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    /// White seat's display name (placeholder if unnamed).
    pub white: String,
    /// Black seat's display name (placeholder if unnamed).
    pub black: String,
    pub viewer_count: usize,
}

// ---------------------------------------------------------------------------
// ClientEvent — what the browser sends
// ---------------------------------------------------------------------------

/// Events a client may send to the coordinator.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "joinSession", "sessionId": "...", "token": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Enter the matchmaking queue (or keep waiting if already in it).
    RequestMatch,

    /// Join a session, optionally presenting a possession token.
    /// No token, or a token matching neither seat, means spectator.
    JoinSession {
        session_id: SessionId,
        #[serde(default)]
        token: Option<SeatToken>,
    },

    /// Submit a complete move for the session this connection is in.
    SubmitMove(MoveSpec),
}

// ---------------------------------------------------------------------------
// ServerEvent — what the coordinator emits
// ---------------------------------------------------------------------------

/// Events the coordinator sends to clients.
///
/// Room-scoped unless the variant says otherwise; the broadcast router
/// decides fan-out, these types only carry the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// To the requester only: the matchmaking slot is occupied, no pairing yet.
    WaitingForOpponent,

    /// To each paired connection only. The token is the recipient's personal
    /// seat secret and must never be echoed to the room.
    MatchedSession {
        session_id: SessionId,
        token: SeatToken,
    },

    /// To the joiner only: the role the join protocol resolved.
    RoleAssigned { role: Role },

    /// Full current position (FEN). Sent to a joiner on entry and broadcast
    /// to the room after every applied move.
    PositionSnapshot { position: String },

    /// Broadcast after a legal move is applied.
    MoveApplied(MoveSpec),

    /// To the submitter only: the move was rejected by the rules engine.
    InvalidMove {
        #[serde(rename = "move")]
        move_spec: MoveSpec,
        reason: String,
    },

    /// Seat occupancy changed. `None` means the seat is not currently bound.
    RosterUpdated {
        white: Option<String>,
        black: Option<String>,
    },

    /// Spectator count changed.
    ViewerCountChanged { count: usize },

    /// Both seats are bound; gameplay is permitted.
    GameStarted,

    /// Terminal state reached; `result` is the human-readable summary.
    GameEnded { result: String },

    /// To connections not inside any session: the set of playing sessions
    /// changed.
    SessionListUpdated { sessions: Vec<SessionSummary> },

    /// To the offending connection only (e.g. unknown session id).
    ProtocolError { message: String },
}

// =========================================================================
// Tests
// =========================================================================
