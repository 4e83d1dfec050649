//! Coordinator configuration.

use std::time::Duration;

/// Tunable timing for session reclamation.
///
/// Ended sessions linger for a grace period so clients still in the room can
/// read the result before the session disappears from the registry.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Grace before reclaiming a session that ended over the board
    /// (checkmate, stalemate, draw).
    pub game_over_grace: Duration,

    /// Grace before reclaiming a session that ended by disconnect forfeit.
    /// Shorter than [`game_over_grace`](Self::game_over_grace): the remaining
    /// player already knows the opponent is gone.
    pub forfeit_grace: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            game_over_grace: Duration::from_secs(30),
            forfeit_grace: Duration::from_secs(10),
        }
    }
}
