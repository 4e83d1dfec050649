//! Wire protocol for Skewer.
//!
//! Defines the event vocabulary that browser clients and the coordinator
//! speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`MoveSpec`], identity
//!   newtypes) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those events become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer knows nothing about connections, sessions, or chess
//! rules — it is pure vocabulary.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, Color, MoveSpec, PromotionPiece, Role, SeatToken, ServerEvent,
    SessionId, SessionSummary,
};
