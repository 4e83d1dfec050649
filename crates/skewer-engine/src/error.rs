//! Error types for the rules engine adapter.

/// Errors the engine reports back to the turn gate.
///
/// All of these surface to the submitting client as an `invalidMove` with
/// the error's display string as the reason — none of them are server
/// faults, and none propagate past the gate.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A square was not valid algebraic notation ("e4", "h8", ...).
    #[error("malformed square: {0}")]
    MalformedSquare(String),

    /// The move is well-formed but not legal in the current position.
    /// Covers wrong-color pieces, blocked paths, moving into check, and
    /// promotion moves missing their piece choice.
    #[error("illegal move")]
    IllegalMove,

    /// A serialized position could not be decoded.
    #[error("unparseable position: {0}")]
    BadPosition(String),
}
