//! Single-slot matchmaking.
//!
//! One connection can wait at a time. The next distinct, live requester is
//! paired with it; everything else keeps the requester waiting.

use skewer_transport::ConnectionId;

/// Outcome of a match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// The requester now occupies the slot (or already did).
    Waiting,
    /// Two distinct live connections paired. `first` entered the queue
    /// first and takes the white seat.
    Paired {
        first: ConnectionId,
        second: ConnectionId,
    },
}

/// The one-deep matchmaking queue.
#[derive(Debug, Default)]
pub struct MatchSlot {
    waiting: Option<ConnectionId>,
}

impl MatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a match request from `requester`.
    ///
    /// `is_live` reports whether a connection can still be delivered to; a
    /// stale occupant that disconnected without being cleared is evicted and
    /// the requester takes its place rather than being paired with a ghost.
    pub fn request(
        &mut self,
        requester: ConnectionId,
        is_live: impl Fn(ConnectionId) -> bool,
    ) -> MatchDecision {
        match self.waiting {
            None => {
                self.waiting = Some(requester);
                MatchDecision::Waiting
            }
            Some(occupant) if occupant == requester => MatchDecision::Waiting,
            Some(occupant) => {
                self.waiting = None;
                if is_live(occupant) {
                    MatchDecision::Paired {
                        first: occupant,
                        second: requester,
                    }
                } else {
                    self.waiting = Some(requester);
                    MatchDecision::Waiting
                }
            }
        }
    }

    /// Clears the slot if `connection` occupies it. Returns `true` if cleared.
    pub fn cancel(&mut self, connection: ConnectionId) -> bool {
        if self.waiting == Some(connection) {
            self.waiting = None;
            true
        } else {
            false
        }
    }

    /// The connection currently waiting, if any.
    pub fn occupant(&self) -> Option<ConnectionId> {
        self.waiting
    }
}
