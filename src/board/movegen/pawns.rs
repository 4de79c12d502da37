//! Pawn move generation.
//!
//! Pawns are generated set-wise: the whole pawn bitboard is shifted toward
//! the target squares and the source square is recovered from the shift
//! distance. Edge-file masks keep captures from wrapping across the board.

use super::super::attack_tables::PAWN_ATTACKS;
use super::super::{Bitboard, Board, Color, Move, MoveList, Piece, Square, PROMOTION_PIECES};

impl Board {
    pub(super) fn generate_pawn_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let us = self.side_to_move();
        let c_idx = us.index();
        let pawns = self.pieces[c_idx][Piece::Pawn.index()];
        let enemy = self.occupied[us.opponent().index()];
        let empty = self.all_occupied.not();

        let (promo_rank, double_target_rank) = match us {
            Color::White => (Bitboard::RANK_8, Bitboard::RANK_4),
            Color::Black => (Bitboard::RANK_1, Bitboard::RANK_5),
        };
        let push = |bb: Bitboard| match us {
            Color::White => bb.shift_north(),
            Color::Black => bb.shift_south(),
        };
        // Offset from a push target back to its source square
        let push_delta: isize = match us {
            Color::White => -8,
            Color::Black => 8,
        };

        let single_pushes = push(pawns).and(empty);

        if !captures_only {
            for to in single_pushes.and(promo_rank.not()).iter() {
                let from = Square::from_index((to.index() as isize + push_delta) as usize);
                moves.push(Move::quiet(from, to));
            }

            let double_pushes = push(single_pushes).and(empty).and(double_target_rank);
            for to in double_pushes.iter() {
                let from = Square::from_index((to.index() as isize + 2 * push_delta) as usize);
                moves.push(Move::double_pawn_push(from, to));
            }
        }

        // Push promotions count as tactical: they appear even in
        // captures-only generation
        for to in single_pushes.and(promo_rank).iter() {
            let from = Square::from_index((to.index() as isize + push_delta) as usize);
            for promo in PROMOTION_PIECES {
                moves.push(Move::promotion(from, to, promo, false));
            }
        }

        // Captures toward each side; the file masks are folded into
        // shift_east/shift_west
        let west_attacks = push(pawns).shift_west().and(enemy);
        let east_attacks = push(pawns).shift_east().and(enemy);
        for (attacks, file_delta) in [(west_attacks, -1isize), (east_attacks, 1isize)] {
            for to in attacks.iter() {
                let from = Square::from_index(
                    (to.index() as isize + push_delta - file_delta) as usize,
                );
                if promo_rank.contains(to) {
                    for promo in PROMOTION_PIECES {
                        moves.push(Move::promotion(from, to, promo, true));
                    }
                } else {
                    moves.push(Move::capture(from, to));
                }
            }
        }

        if let Some(ep) = self.en_passant {
            // Our pawns that attack the en passant square are exactly the
            // squares an enemy pawn on that square would attack
            let attackers =
                Bitboard(PAWN_ATTACKS[us.opponent().index()][ep.index()]).and(pawns);
            for from in attackers.iter() {
                moves.push(Move::en_passant(from, ep));
            }
        }
    }
}
