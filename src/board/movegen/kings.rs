//! King move generation, including castling emission.
//!
//! Castling is emitted when the rights are set, the squares between king
//! and rook are empty and the king sits on its home square. Whether the
//! king is in check or would cross an attacked square is tested at
//! make-move time, not here.

use super::super::attack_tables::king_attacks;
use super::super::{Board, Color, Move, MoveList, Piece, Square};

impl Board {
    pub(super) fn generate_king_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let us = self.side_to_move();
        let own = self.occupied[us.index()];
        let enemy = self.occupied[us.opponent().index()];

        for from in self.pieces[us.index()][Piece::King.index()].iter() {
            let targets = king_attacks(from).and(own.not());
            for to in targets.iter() {
                if enemy.contains(to) {
                    moves.push(Move::capture(from, to));
                } else if !captures_only {
                    moves.push(Move::quiet(from, to));
                }
            }
        }

        if !captures_only {
            self.generate_castling(us, moves);
        }
    }

    fn generate_castling(&self, us: Color, moves: &mut MoveList) {
        let back_rank = match us {
            Color::White => 0,
            Color::Black => 7,
        };
        let king_home = Square::new(back_rank, 4);
        if self.piece_at(king_home) != Some((us, Piece::King)) {
            return;
        }

        if self.has_castling_right(us, 'K')
            && self.is_empty_square(Square::new(back_rank, 5))
            && self.is_empty_square(Square::new(back_rank, 6))
            && self.piece_at(Square::new(back_rank, 7)) == Some((us, Piece::Rook))
        {
            moves.push(Move::castle_kingside(king_home, Square::new(back_rank, 6)));
        }

        if self.has_castling_right(us, 'Q')
            && self.is_empty_square(Square::new(back_rank, 1))
            && self.is_empty_square(Square::new(back_rank, 2))
            && self.is_empty_square(Square::new(back_rank, 3))
            && self.piece_at(Square::new(back_rank, 0)) == Some((us, Piece::Rook))
        {
            moves.push(Move::castle_queenside(king_home, Square::new(back_rank, 2)));
        }
    }
}
