//! Session coordination for Skewer.
//!
//! This crate is the server's brain: single-slot matchmaking, the session
//! registry with possession-token seats, the turn and move gate, room
//! broadcast routing, and timed session reclamation. The [`Coordinator`]
//! service object holds all of it behind synchronous methods; the
//! [`actor`] module runs one on a dedicated task and hands out a
//! [`CoordinatorHandle`].

mod actor;
mod config;
mod coordinator;
mod error;
mod matchmaking;
mod registry;
mod router;

pub use actor::{spawn_coordinator, CoordinatorCommand, CoordinatorHandle};
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, ReapOrder};
pub use error::CoordinatorError;
pub use matchmaking::{MatchDecision, MatchSlot};
pub use registry::{Seat, Session, SessionRegistry, SessionStatus};
pub use router::{BroadcastRouter, EventSender};
