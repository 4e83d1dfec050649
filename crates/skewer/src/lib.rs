//! Skewer: a real-time chess session server.
//!
//! Browser clients connect over WebSocket, get paired through a single-slot
//! matchmaking queue, and hold their seats with possession tokens so a page
//! reload never loses a game. Everyone else can spectate. An HTTP listener
//! serves the lobby: the listing of live games and the per-session game
//! page.
//!
//! The heavy lifting lives in the member crates:
//! [`skewer_coordinator`] (state machine), [`skewer_engine`] (chess rules),
//! [`skewer_transport`] (WebSocket plumbing), and [`skewer_protocol`] (wire
//! format). This crate wires them into a runnable server.

mod error;
pub mod handler;
pub mod http;
mod server;

pub use error::ServerError;
pub use server::{Server, ServerConfig};
