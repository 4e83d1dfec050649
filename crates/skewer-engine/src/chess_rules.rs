//! [`ChessRules`]: the production [`RulesEngine`] backed by the `chess`
//! crate.
//!
//! This is a thin adapter — all chess knowledge lives in the library, and
//! everything specific to the `chess` crate's types stays inside this file.
//! Positions serialize as FEN, which is also what board UIs consume.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Piece, Square};
use skewer_protocol::{Color, MoveSpec, PromotionPiece};

use crate::{EngineError, RulesEngine, TerminalStatus};

/// Standard-chess rules via the `chess` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessRules;

impl ChessRules {
    fn parse_square(name: &str) -> Result<Square, EngineError> {
        Square::from_str(name)
            .map_err(|_| EngineError::MalformedSquare(name.to_string()))
    }
}

fn promotion_piece(piece: PromotionPiece) -> Piece {
    match piece {
        PromotionPiece::Queen => Piece::Queen,
        PromotionPiece::Rook => Piece::Rook,
        PromotionPiece::Bishop => Piece::Bishop,
        PromotionPiece::Knight => Piece::Knight,
    }
}

impl RulesEngine for ChessRules {
    type Position = Board;

    fn initial(&self) -> Board {
        Board::default()
    }

    fn apply_move(
        &self,
        position: &Board,
        mv: &MoveSpec,
    ) -> Result<Board, EngineError> {
        let from = Self::parse_square(&mv.from)?;
        let to = Self::parse_square(&mv.to)?;
        let chess_move =
            ChessMove::new(from, to, mv.promotion.map(promotion_piece));

        // A promotion submitted without its piece choice fails here too:
        // "e7e8" with no promotion is simply not in the legal move set.
        if !position.legal(chess_move) {
            return Err(EngineError::IllegalMove);
        }
        Ok(position.make_move_new(chess_move))
    }

    fn side_to_move(&self, position: &Board) -> Color {
        match position.side_to_move() {
            chess::Color::White => Color::White,
            chess::Color::Black => Color::Black,
        }
    }

    fn terminal_status(&self, position: &Board) -> TerminalStatus {
        match position.status() {
            BoardStatus::Ongoing => TerminalStatus::Ongoing,
            // The side to move is the one who got mated.
            BoardStatus::Checkmate => TerminalStatus::Checkmate {
                winner: self.side_to_move(position).opposite(),
            },
            BoardStatus::Stalemate => TerminalStatus::Stalemate,
        }
    }

    fn serialize(&self, position: &Board) -> String {
        position.to_string()
    }

    fn deserialize(&self, encoded: &str) -> Result<Board, EngineError> {
        Board::from_str(encoded)
            .map_err(|e| EngineError::BadPosition(e.to_string()))
    }
}
