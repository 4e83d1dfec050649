//! Rules engine adapter for Skewer.
//!
//! The coordinator consumes chess through the narrow [`RulesEngine`] seam:
//! apply a move, query the side to move, query terminal status, serialize.
//! [`ChessRules`] is the production implementation, wrapping the `chess`
//! crate; tests elsewhere substitute scripted fakes.

mod chess_rules;
mod error;
mod rules;

pub use chess_rules::ChessRules;
pub use error::EngineError;
pub use rules::{RulesEngine, TerminalStatus};
