//! The [`RulesEngine`] trait — the narrow seam between the coordinator and
//! whatever actually knows the rules of chess.
//!
//! The coordinator treats positions as opaque handles: it asks the engine to
//! apply a move, whose turn it is, and whether the game is over, and never
//! inspects engine internals. That keeps the real state-machine code (turn
//! gating, lifecycle) independently testable with a scripted fake.

use skewer_protocol::{Color, MoveSpec};

use crate::EngineError;

/// The terminal status of a position, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    /// Moves are still legal; the game continues.
    Ongoing,
    /// The side to move is checkmated.
    Checkmate { winner: Color },
    /// The side to move has no legal moves but is not in check.
    Stalemate,
    /// Any other draw condition the engine detects.
    Draw,
}

impl TerminalStatus {
    /// Returns `true` when no further moves are legal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// The human-readable outcome summary, or `None` while ongoing.
    ///
    /// Checkmate names the winner; the draw variants do not.
    pub fn summary(&self) -> Option<String> {
        match self {
            Self::Ongoing => None,
            Self::Checkmate { winner } => {
                Some(format!("Checkmate! {winner} wins."))
            }
            Self::Stalemate => Some("Stalemate.".to_string()),
            Self::Draw => Some("Draw!".to_string()),
        }
    }
}

/// Validates and applies moves against an opaque position handle.
///
/// Implementations must be pure with respect to positions: `apply_move`
/// returns a new position and never mutates its input, so a rejected move
/// can never corrupt session state.
pub trait RulesEngine: Send + Sync + 'static {
    /// The opaque position handle. Cloned into snapshots, owned by sessions.
    type Position: Clone + Send + Sync + 'static;

    /// The starting position of a fresh game.
    fn initial(&self) -> Self::Position;

    /// Validates `mv` against `position` and, if legal, returns the
    /// resulting position.
    ///
    /// # Errors
    /// Returns [`EngineError`] when the move is malformed or illegal; the
    /// input position is unaffected either way.
    fn apply_move(
        &self,
        position: &Self::Position,
        mv: &MoveSpec,
    ) -> Result<Self::Position, EngineError>;

    /// The color whose turn it is in `position`.
    fn side_to_move(&self, position: &Self::Position) -> Color;

    /// Whether `position` is terminal, and how.
    fn terminal_status(&self, position: &Self::Position) -> TerminalStatus;

    /// Encodes `position` for transmission to clients.
    fn serialize(&self, position: &Self::Position) -> String;

    /// Decodes a position previously produced by [`serialize`](Self::serialize).
    ///
    /// # Errors
    /// Returns [`EngineError::BadPosition`] if `encoded` is not a valid
    /// position.
    fn deserialize(&self, encoded: &str) -> Result<Self::Position, EngineError>;
}
